include!("compressed_zones.rs.data");
