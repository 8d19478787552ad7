//! Grade a metrics log

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use smartcab_sim::grade;
use smartcab_sim::metrics::read_records;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON-lines log written by `smartcab run`
    pub log: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &ReportArgs) -> Result<()> {
    let records = read_records(&args.log)?;
    let report = grade(&records);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let show = |rating: Option<smartcab_sim::Rating>| {
        rating.map_or_else(|| "n/a".to_string(), |r| r.to_string())
    };

    println!("Report for {}", args.log.display());
    println!("Training trials:  {}", report.training_trials);
    println!("Testing trials:   {}", report.testing_trials);
    println!("Average reward:   {:.2}", report.average_reward);
    println!("Safety rating:    {}", show(report.safety));
    println!("Reliability:      {}", show(report.reliability));
    Ok(())
}
