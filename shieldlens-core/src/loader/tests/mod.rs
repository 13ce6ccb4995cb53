
pub(super) const LINE_A: &str =
    r#"10.0.0.1 - - [10/Jan/2024:10:00:00 +0000] "GET /a HTTP/1.1" 200 512 "-" "Mozilla/5.0""#;
pub(super) const LINE_B: &str =
    r#"10.0.0.2 - - [10/Jan/2024:10:01:00 +0000] "POST /b HTTP/1.1" 404 0 "-" "curl/8.0""#;
pub(super) const LINE_C: &str =
    r#"10.0.0.3 - - [10/Jan/2024:10:02:00 +0000] "GET /c HTTP/2.0" 500 9 "-" "Googlebot/2.1""#;
pub(super) const BAD_STATUS: &str =
    r#"10.0.0.9 - - [10/Jan/2024:10:00:00 +0000] "GET / HTTP/1.1" 20 512 "-" "Mozilla/5.0""#;
