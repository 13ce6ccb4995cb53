use crate::enrichment::{EnrichmentError, GeoInfo, GeoLookup, NetworkInfo, NetworkLookup};
use maxminddb::{Mmap, PathElement, Reader};
use std::net::IpAddr;
use std::path::Path;

fn open_reader(path: &Path) -> Result<Reader<Mmap>, EnrichmentError> {
    // Safety note on these memory-mapped GeoIP files...
    // - File is opened read-only
    // - Lifetime is bound to the owning lookup
    // - Shieldlens never mutates the mmdb file
    unsafe { Reader::open_mmap(path) }.map_err(|e| EnrichmentError::open_database(path, e))
}

/// City-level geolocation from a MaxMind City database.
pub struct MaxMindGeo {
    city_reader: Reader<Mmap>,
}

impl MaxMindGeo {
    pub fn open(path: &Path) -> Result<Self, EnrichmentError> {
        Ok(Self {
            city_reader: open_reader(path)?,
        })
    }
}

impl GeoLookup for MaxMindGeo {
    fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let ip = ip.parse::<IpAddr>().ok()?;
        let lookup = self.city_reader.lookup(ip).ok()?;

        let geo = GeoInfo {
            country: lookup
                .decode_path::<String>(&[PathElement::Key("country"), PathElement::Key("iso_code")])
                .ok()
                .flatten(),
            latitude: lookup
                .decode_path::<f64>(&[PathElement::Key("location"), PathElement::Key("latitude")])
                .ok()
                .flatten(),
            longitude: lookup
                .decode_path::<f64>(&[
                    PathElement::Key("location"),
                    PathElement::Key("longitude"),
                ])
                .ok()
                .flatten(),
        };

        geo.has_some_info().then_some(geo)
    }
}

/// Network ownership from the MaxMind ISP and Connection-Type databases.
/// Either database may be absent.
pub struct MaxMindNetwork {
    isp_reader: Option<Reader<Mmap>>,
    connection_type_reader: Option<Reader<Mmap>>,
}

impl MaxMindNetwork {
    pub fn open(
        isp_db: Option<&Path>,
        connection_type_db: Option<&Path>,
    ) -> Result<Self, EnrichmentError> {
        Ok(Self {
            isp_reader: isp_db.map(open_reader).transpose()?,
            connection_type_reader: connection_type_db.map(open_reader).transpose()?,
        })
    }
}

impl NetworkLookup for MaxMindNetwork {
    fn lookup(&self, ip: &str) -> Option<NetworkInfo> {
        let ip = ip.parse::<IpAddr>().ok()?;
        let mut network = NetworkInfo::default();

        //-----------------------------------------------------------------
        // ISP, falling back to the AS organization
        //-----------------------------------------------------------------
        let lookup = self
            .isp_reader
            .as_ref()
            .and_then(|reader| reader.lookup(ip).ok());

        if let Some(lookup) = lookup {
            network.isp = lookup
                .decode_path::<String>(&[PathElement::Key("isp")])
                .ok()
                .flatten()
                .or_else(|| {
                    lookup
                        .decode_path::<String>(&[PathElement::Key(
                            "autonomous_system_organization",
                        )])
                        .ok()
                        .flatten()
                });
        }

        //-----------------------------------------------------------------
        // Connection-type
        //-----------------------------------------------------------------
        let lookup = self
            .connection_type_reader
            .as_ref()
            .and_then(|reader| reader.lookup(ip).ok());

        if let Some(lookup) = lookup {
            network.usage_type = lookup
                .decode_path::<String>(&[PathElement::Key("connection_type")])
                .ok()
                .flatten();
        }

        network.has_some_info().then_some(network)
    }
}
