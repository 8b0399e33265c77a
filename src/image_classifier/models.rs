pub mod model_config;
pub mod resnet;
