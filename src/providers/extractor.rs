use std::path::Path;

use bytes::Bytes;

use crate::error::ExtractError;

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Leading directory removed from every member; members outside it are skipped.
    pub strip_prefix: Option<String>,
}

pub trait Extractor {
    fn extract(
        &self,
        content: &Bytes,
        folder: &Path,
        options: Option<&ExtractOptions>,
    ) -> impl std::future::Future<Output = Result<(), ExtractError>> + Send;
}
