pub mod fix;
pub mod gps_time;
