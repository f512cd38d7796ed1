use anyhow::{Result, anyhow};
use aws_sdk_elastictranscoder::types::{CreateJobOutput, JobInput};
use log::{debug, info};
use std::future::Future;

pub struct Rendition {
    pub extension: &'static str,
    pub preset_id: &'static str,
    pub description: &'static str,
}

/// Elastic Transcoder system presets requested for every upload.
pub const RENDITIONS: [Rendition; 3] = [
    Rendition {
        extension: "mp4",
        preset_id: "1351620000001-100070",
        description: "Web: Facebook, SmugMug, Vimeo, YouTube",
    },
    Rendition {
        extension: "webm",
        preset_id: "1351620000001-100240",
        description: "Webm 720p",
    },
    Rendition {
        extension: "mp3",
        preset_id: "1351620000001-300020",
        description: "Audio MP3 - 192 kilobits/second",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub key: String,
    pub preset_id: &'static str,
    pub thumbnail_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub pipeline_id: String,
    pub input_key: String,
    pub output_key_prefix: String,
    pub outputs: Vec<JobOutput>,
}

impl TranscodeJob {
    pub fn new<T>(key: &str, pipeline_id: T) -> Self
    where
        T: Into<String>,
    {
        let outputs = RENDITIONS
            .iter()
            .map(|r| JobOutput {
                key: format!("{}.{}", key, r.extension),
                preset_id: r.preset_id,
                thumbnail_pattern: String::new(),
            })
            .collect();

        Self {
            pipeline_id: pipeline_id.into(),
            input_key: key.to_string(),
            output_key_prefix: format!("{}/conversions/", key),
            outputs,
        }
    }
}

/// Sends a job to the transcoding service, returning the created job's id.
pub trait JobSubmitter {
    fn submit(&self, job: &TranscodeJob) -> impl Future<Output = Result<String>> + Send;
}

pub struct ElasticTranscoder {
    client: aws_sdk_elastictranscoder::Client,
}

impl ElasticTranscoder {
    pub fn new(client: aws_sdk_elastictranscoder::Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self::new(aws_sdk_elastictranscoder::Client::new(&aws_config))
    }
}

impl JobSubmitter for ElasticTranscoder {
    async fn submit(&self, job: &TranscodeJob) -> Result<String> {
        let outputs = job
            .outputs
            .iter()
            .map(|o| {
                CreateJobOutput::builder()
                    .key(&o.key)
                    .preset_id(o.preset_id)
                    .thumbnail_pattern(&o.thumbnail_pattern)
                    .build()
            })
            .collect();

        debug!("Creating job in pipeline {}", job.pipeline_id);
        let response = self
            .client
            .create_job()
            .pipeline_id(&job.pipeline_id)
            .output_key_prefix(&job.output_key_prefix)
            .input(JobInput::builder().key(&job.input_key).build())
            .set_outputs(Some(outputs))
            .send()
            .await?;
        debug!("Elastic Transcoder Response: {:?}", response);

        response
            .job()
            .and_then(|j| j.id())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("missing job id"))
    }
}

pub async fn submit_transcode_jobs<S>(submitter: &S, key: &str, pipeline_id: &str) -> Result<String>
where
    S: JobSubmitter,
{
    info!("Triggering transcode job for {}", key);

    let job = TranscodeJob::new(key, pipeline_id);
    let job_id = submitter.submit(&job).await?;

    info!("Created transcode job {} for {}", job_id, key);

    Ok(job_id)
}
