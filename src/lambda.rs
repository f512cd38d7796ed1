use aws_lambda_events::s3::S3Event;
use lambda_runtime::{LambdaEvent, service_fn};
use log::{debug, info};
use serde_json::{Value, json};
use std::error::Error;
use transcoder_trigger::transcoder::ElasticTranscoder;
use transcoder_trigger::{Config, set_up_logger, trigger};

type LambdaError = Box<dyn Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    let transcoder = ElasticTranscoder::from_env().await;

    let func = service_fn(|event| function(event, &transcoder));
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn function(
    event: LambdaEvent<Value>,
    transcoder: &ElasticTranscoder,
) -> Result<Value, LambdaError> {
    let config = Config::from_env()?;
    set_up_logger(module_path!(), config.log_level)?;
    debug!("Processing event: {:?}", event.payload);

    let event: S3Event = serde_json::from_value(event.payload)?;
    let job_ids = trigger::handle_event(event, &config.pipeline_id, transcoder).await?;
    info!("Submitted {} transcode job(s)", job_ids.len());

    Ok(json!({}))
}
