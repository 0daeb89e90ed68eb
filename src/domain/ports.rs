use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Directory holding the five extracts.
    fn data_dir(&self) -> &str;
    /// File-name prefix shared by the extracts, e.g. `snip_2025Q4`.
    fn dataset_prefix(&self) -> &str;
    /// Rows printed per table in text output.
    fn table_rows(&self) -> usize;
}
