//! proj-string definitions for the EPSG codes the engine can resolve.
//!
//! Covers the systems Andean administrative and climate layers are published
//! in: WGS84 and its UTM zones, SIRGAS 2000 and its UTM zones, PSAD56 and its
//! UTM zones. Web Mercator is handled by inline math and has no entry here.

const WGS84: &str = "+datum=WGS84";
const SIRGAS2000: &str = "+ellps=GRS80 +towgs84=0,0,0,0,0,0,0";
const PSAD56: &str = "+ellps=intl +towgs84=-288,175,-376,0,0,0,0";

/// proj string for `epsg`, or `None` when the code is not in the table.
pub fn proj_string(epsg: u32) -> Option<String> {
    let def = match epsg {
        4326 => longlat(WGS84),
        4674 => longlat(SIRGAS2000),
        4248 => longlat(PSAD56),
        32601..=32660 => utm(epsg - 32600, false, WGS84),
        32701..=32760 => utm(epsg - 32700, true, WGS84),
        // SIRGAS 2000 / UTM 11N..22N, then 17S..25S.
        31965..=31976 => utm(epsg - 31954, false, SIRGAS2000),
        31977..=31985 => utm(epsg - 31960, true, SIRGAS2000),
        // PSAD56 / UTM 17N..21N, then 17S..22S.
        24817..=24821 => utm(epsg - 24800, false, PSAD56),
        24877..=24882 => utm(epsg - 24860, true, PSAD56),
        _ => return None,
    };
    Some(def)
}

/// True for systems whose coordinates are (lon, lat) degrees.
pub fn is_geographic(epsg: u32) -> bool {
    matches!(epsg, 4326 | 4674 | 4248)
}

fn longlat(datum: &str) -> String {
    format!("+proj=longlat {datum} +no_defs")
}

fn utm(zone: u32, south: bool, datum: &str) -> String {
    let hemisphere = if south { " +south" } else { "" };
    format!("+proj=utm +zone={zone}{hemisphere} {datum} +units=m +no_defs")
}
