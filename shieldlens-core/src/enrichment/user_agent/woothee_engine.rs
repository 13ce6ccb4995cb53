use woothee::parser::Parser;

pub struct WootheeEngine {
    parser: Parser,
}

impl WootheeEngine {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn is_bot(&self, ua: &str) -> bool {
        self.parser
            .parse(ua)
            .is_some_and(|result| result.category == "crawler")
    }
}
