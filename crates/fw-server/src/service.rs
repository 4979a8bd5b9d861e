use std::path::Path;
use std::sync::Arc;

use filewhisperer_engine::EnginePool;
use filewhisperer_types::{FilePayload, Payload};
use tonic::{Request, Response, Status};

use crate::config::Config;
use crate::error::ServiceError;
use crate::proto;
use crate::proto::file_whisperer_server::FileWhisperer;

/// The RPC surface: validate the request, read its bytes (mapped from disk
/// or taken inline), run one digest pass through a pooled [`Dissector`],
/// and serialize the resulting tree.
pub struct FileWhispererService {
    pool: Arc<EnginePool>,
    output_dir: std::path::PathBuf,
    debug_backup_dir: Option<std::path::PathBuf>,
}

impl FileWhispererService {
    pub fn new(pool: Arc<EnginePool>, config: &Config) -> Self {
        Self {
            pool,
            output_dir: config.output_dir.clone(),
            debug_backup_dir: config.debug_backup_dir.clone(),
        }
    }

    fn read_source(request: &proto::DissectRequest) -> Result<(String, Vec<u8>), ServiceError> {
        match &request.source {
            Some(proto::dissect_request::Source::FilePath(path)) => {
                let file = std::fs::File::open(path)?;
                // SAFETY: the mapped file is only read, and its lifetime is
                // confined to this function; nothing else can truncate it
                // out from under us within this request.
                let map = unsafe { memmap2::Mmap::map(&file)? };
                Ok((path.clone(), map.to_vec()))
            }
            Some(proto::dissect_request::Source::FileContent(bytes)) => {
                Ok(("inline".to_owned(), bytes.clone()))
            }
            None => Err(ServiceError::InvalidRequest(
                "exactly one of file_path or file_content must be set".to_owned(),
            )),
        }
    }

    fn maybe_backup(&self, name: &str, content: &[u8]) -> Result<(), ServiceError> {
        let Some(dir) = &self.debug_backup_dir else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%f");
        let base = Path::new(name).file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "file".to_owned());
        std::fs::write(dir.join(format!("{stamp}-{base}")), content)?;
        Ok(())
    }
}

#[tonic::async_trait]
impl FileWhisperer for FileWhispererService {
    async fn dissect(
        &self,
        request: Request<proto::DissectRequest>,
    ) -> Result<Response<proto::DissectReply>, Status> {
        let request = request.into_inner();
        let (name, content) = Self::read_source(&request)?;
        self.maybe_backup(&name, &content)?;

        let payload = Payload::File(FilePayload::new(name, content));
        let passwords = request.passwords;
        let pdf_max_pages = request.pdf_max_pages.unwrap_or(10);
        let word_max_pages = request.word_max_pages.unwrap_or(10);

        let dissector = self
            .pool
            .acquire()
            .await
            .map_err(ServiceError::from)?;
        let tree = dissector
            .dissect(payload, passwords, pdf_max_pages, word_max_pages, request.root_id)
            .await
            .map_err(ServiceError::from)?;

        let reply = crate::serializer::serialize(&tree, &self.output_dir)?;
        Ok(Response::new(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_file_name_keeps_original_basename() {
        let base = Path::new("/tmp/some/dir/report.pdf")
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        assert_eq!(base.as_deref(), Some("report.pdf"));
    }
}
