pub mod binary_fetcher;

pub mod downloader;
pub mod http_downloader;

pub mod clock;
pub mod transport;

pub mod extractor;
pub mod tar_gz_extractor;
