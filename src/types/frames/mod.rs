pub mod ndvi_frame;
pub mod observation_frame;
