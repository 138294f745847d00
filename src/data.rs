pub mod osm;
pub mod records;
