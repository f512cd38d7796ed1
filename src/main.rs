use anyhow::Result;
use aws_lambda_events::s3::S3Event;
use clap::{Arg, ArgAction, ArgGroup, Command};
use log::{LevelFilter, debug, info};
use std::path::PathBuf;
use transcoder_trigger::transcoder::{ElasticTranscoder, JobSubmitter, RENDITIONS, TranscodeJob};
use transcoder_trigger::trigger;

#[derive(Debug)]
struct Args {
    pipeline_id: String,
    event: Option<PathBuf>,
    keys: Vec<String>,
    dry_run: bool,
    verbose: bool,
}

fn parse_args() -> Args {
    let matches = Command::new("TranscoderTrigger")
        .version("0.1")
        .arg(
            Arg::new("pipeline-id")
                .short('p')
                .long("pipeline-id")
                .required(true)
                .env(transcoder_trigger::PIPELINE_ID_VAR)
                .help("Elastic Transcoder pipeline ID, e.g. 1561436417428-xtx4ve."),
        )
        .arg(
            Arg::new("event")
                .short('e')
                .long("event")
                .value_parser(clap::value_parser!(PathBuf))
                .help("S3 event JSON file to process."),
        )
        .arg(
            Arg::new("keys")
                .value_name("KEY")
                .num_args(1..)
                .help("Object keys to transcode."),
        )
        .group(
            ArgGroup::new("input")
                .args(["event", "keys"])
                .required(true),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Log the jobs that would be created without submitting them."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Verbose mode. Outputs DEBUG and higher log messages."),
        )
        .get_matches();

    let pipeline_id = matches
        .get_one::<String>("pipeline-id")
        .cloned()
        .unwrap_or_default();

    let event = matches.get_one::<PathBuf>("event").cloned();

    let keys = matches
        .get_many::<String>("keys")
        .map(|k| k.cloned().collect())
        .unwrap_or_default();

    let dry_run = matches.get_flag("dry-run");

    let verbose = matches.get_flag("verbose");

    Args {
        pipeline_id,
        event,
        keys,
        dry_run,
        verbose,
    }
}

/// Logs jobs instead of submitting them.
struct DryRun;

impl JobSubmitter for DryRun {
    async fn submit(&self, job: &TranscodeJob) -> Result<String> {
        info!(
            "Would create job in pipeline {} for {} with prefix {}",
            job.pipeline_id, job.input_key, job.output_key_prefix
        );
        for (output, rendition) in job.outputs.iter().zip(RENDITIONS.iter()) {
            info!(
                "  {} <- {} ({})",
                output.key, output.preset_id, rendition.description
            );
        }

        Ok("dry-run".to_string())
    }
}

async fn run<S>(args: Args, submitter: &S) -> Result<Vec<String>>
where
    S: JobSubmitter,
{
    match args.event {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path).await?;
            let event: S3Event = serde_json::from_str(&content)?;
            trigger::handle_event(event, &args.pipeline_id, submitter).await
        }
        None => trigger::handle_keys(&args.keys, &args.pipeline_id, submitter).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    transcoder_trigger::set_up_logger(module_path!(), level)?;
    debug!("{:?}", args);

    let job_ids = if args.dry_run {
        run(args, &DryRun).await?
    } else {
        run(args, &ElasticTranscoder::from_env().await).await?
    };

    for job_id in job_ids {
        println!("{}", job_id);
    }

    Ok(())
}
