//! Result artifact downloads

use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use super::WorkflowError;
use crate::api::ApiClient;

/// Download every result type independently. A failure for one type is
/// logged and skipped; the rest are still attempted.
pub(crate) async fn download_all(
    client: &mut ApiClient,
    order_id: Uuid,
    result_types: &[String],
    folder: &Path,
) -> (Vec<PathBuf>, Vec<String>) {
    let mut downloaded = Vec::new();
    let mut skipped = Vec::new();

    for result_type in result_types {
        match download_one(client, order_id, result_type, folder).await {
            Ok(path) => downloaded.push(path),
            Err(err) => {
                warn!(result_type, error = %err, "skipping result type");
                skipped.push(result_type.clone());
            }
        }
    }

    (downloaded, skipped)
}

async fn download_one(
    client: &mut ApiClient,
    order_id: Uuid,
    result_type: &str,
    folder: &Path,
) -> Result<PathBuf, WorkflowError> {
    let download = client.download_result(order_id, result_type).await?;

    let file_name = download
        .content_disposition
        .as_deref()
        .and_then(attachment_filename)
        .unwrap_or_else(|| format!("{order_id}_{result_type}.bin"));

    let path = folder.join(file_name);
    tokio::fs::write(&path, &download.content).await?;
    info!(
        result_type,
        path = %path.display(),
        size = download.content.len(),
        "downloaded result"
    );
    Ok(path)
}

/// Pull the file name out of a content-disposition style header. Only the
/// trailing name component is kept, so a header can never steer the write
/// outside the download folder.
fn attachment_filename(header: &str) -> Option<String> {
    let (_, value) = header.split_once("filename=")?;
    let name = value
        .split(';')
        .next()
        .unwrap_or(value)
        .trim()
        .trim_matches('"');
    let name = Path::new(name).file_name()?.to_str()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename_variants() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="summary.tsv""#),
            Some("summary.tsv".to_string())
        );
        assert_eq!(
            attachment_filename("attachment; filename=raw.vcf.gz"),
            Some("raw.vcf.gz".to_string())
        );
        assert_eq!(
            attachment_filename(r#"attachment; filename="report.pdf"; size=42"#),
            Some("report.pdf".to_string())
        );
        assert_eq!(attachment_filename("attachment"), None);
        assert_eq!(attachment_filename(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_attachment_filename_strips_path_components() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_string())
        );
    }
}
