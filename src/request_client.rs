use lazy_static::lazy_static;
use reqwest::{Client, ClientBuilder};

const USER_AGENT: &str = concat!("benchctl/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    // Registry requests are sent once, without retries
    pub static ref REQUEST_CLIENT: Client = ClientBuilder::new()
        .user_agent(USER_AGENT)
        .build()
        .unwrap();
}
