use std::sync::LazyLock;

pub mod version;

pub static POISE_VERSION: &str = "0.6.1";
pub static STARTUP_TIME: LazyLock<std::time::SystemTime> =
    LazyLock::new(std::time::SystemTime::now);

pub const QUOTES_KEY: &str = "quotes_v1";
pub const LAST_VIEWED_KEY: &str = "last_quote_v1";

pub const DEFAULT_QUOTES: [(&str, &str); 3] = [
    (
        "The best way to get started is to quit talking and begin doing.",
        "Motivation",
    ),
    (
        "Life is what happens when you're busy making other plans.",
        "Life",
    ),
    (
        "Don’t let yesterday take up too much of today.",
        "Inspiration",
    ),
];

pub const QUOTE_SYNC_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const QUOTE_SYNC_INTERVAL_SECS: u64 = 60;

pub const QUOTES_PER_PAGE: usize = 10;
