//! Turns upload notifications into transcode jobs.

use crate::transcoder::{self, JobSubmitter};
use anyhow::{Result, anyhow};
use aws_lambda_events::s3::S3Event;
use log::{debug, info};

/// Uploaded by the media application to verify bucket access; never transcoded.
pub const PERMISSIONS_CHECK_FILE: &str = "permissions_check_file";

pub fn is_permissions_check(key: &str) -> bool {
    key == PERMISSIONS_CHECK_FILE
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
}

/// Extracts the uploaded objects from `event` in record order, leaving out permission checks.
///
/// A record without an object key fails the whole event.
pub fn uploads(event: S3Event) -> Result<Vec<Upload>> {
    let mut uploads = Vec::with_capacity(event.records.len());
    for (i, record) in event.records.into_iter().enumerate() {
        let key = record
            .s3
            .object
            .key
            .ok_or_else(|| anyhow!("record {} is missing s3.object.key", i))?;
        let bucket = record.s3.bucket.name.unwrap_or_default();

        if is_permissions_check(&key) {
            debug!("Skipping {}/{}", bucket, key);
            continue;
        }

        uploads.push(Upload { bucket, key });
    }

    Ok(uploads)
}

/// Submits one job per uploaded object in `event`, in record order.
///
/// Keys are used exactly as delivered. Malformed events fail before any job is submitted.
pub async fn handle_event<S>(event: S3Event, pipeline_id: &str, submitter: &S) -> Result<Vec<String>>
where
    S: JobSubmitter,
{
    let uploads = uploads(event)?;
    for upload in &uploads {
        info!("File uploaded: {}/{}", upload.bucket, upload.key);
    }

    handle_keys(uploads.iter().map(|u| &u.key), pipeline_id, submitter).await
}

pub async fn handle_keys<I, S>(keys: I, pipeline_id: &str, submitter: &S) -> Result<Vec<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    S: JobSubmitter,
{
    info!("Executing Pipeline: {}", pipeline_id);

    let mut job_ids = Vec::new();
    for key in keys {
        let key = key.as_ref();
        if is_permissions_check(key) {
            debug!("Skipping {}", key);
            continue;
        }

        job_ids.push(transcoder::submit_transcode_jobs(submitter, key, pipeline_id).await?);
    }

    Ok(job_ids)
}
