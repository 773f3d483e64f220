pub mod curl_builder;
pub mod request_builder;
