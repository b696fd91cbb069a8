// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — fine-tune and report (also the default)
//   2. `fetch` — download the subset and describe it
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, FetchArgs, TrainArgs};

use crate::application::{
    fetch_use_case::FetchUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "newsgroup-finetune",
    version,
    about = "Fine-tune DistilBERT on two 20 Newsgroups categories with a one-cycle schedule."
)]
pub struct Cli {
    /// The subcommand to run; `train` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Dispatch to the matching use case. Routes only, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Train(args)) => run_train(args),
            Some(Commands::Fetch(args)) => run_fetch(args),
            None                        => run_train(TrainArgs::default()),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!(
        "Fine-tuning '{}' on {:?} for {} epoch(s)",
        args.model, args.data.categories, args.epochs
    );

    let outcome = TrainUseCase::new(args.into()).execute()?;

    if let Some(best) = outcome
        .history
        .iter()
        .min_by(|a, b| a.val_loss.total_cmp(&b.val_loss))
    {
        println!("\nBest epoch: {} ({})", best.epoch, best);
    }
    println!("\n{}", outcome.report);

    for (text, p) in &outcome.predictions {
        println!("{:<24} {:.3}  {}", p.class_name, p.probability, text);
    }
    Ok(())
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    let summaries = FetchUseCase::new(args.data.into()).execute()?;

    for s in summaries {
        println!("[{}]", s.split);
        for (name, count) in &s.counts {
            println!("  {:<24} {:>6}", name, count);
        }
        if let Some(stats) = s.stats {
            println!(
                "  words per post: mean {:.0}, 95th {:.0}, 99th {:.0}, max {}",
                stats.mean, stats.p95, stats.p99, stats.max
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["newsgroup-finetune"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "newsgroup-finetune", "train",
            "--categories", "sci.space,rec.autos",
            "--epochs", "3",
            "--device", "cpu",
            "--random-init",
            "--remove", "headers,footers",
            "--predict", "the shuttle launched",
            "--predict", "my engine stalls",
        ])
        .unwrap();

        let Some(Commands::Train(args)) = cli.command else {
            panic!("expected the train subcommand");
        };
        assert_eq!(args.data.categories, vec!["sci.space", "rec.autos"]);
        assert_eq!(args.epochs, 3);
        assert_eq!(args.device, commands::DeviceArg::Cpu);
        assert_eq!(args.data.remove.len(), 2);
        assert_eq!(args.predict.len(), 2);
        assert_eq!(args.max_len, 64);
        assert!(args.random_init);
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::try_parse_from(["newsgroup-finetune", "fetch"]).unwrap();
        let Some(Commands::Fetch(args)) = cli.command else {
            panic!("expected the fetch subcommand");
        };
        assert_eq!(args.data.categories, vec!["comp.graphics", "soc.religion.christian"]);
        assert_eq!(args.data.seed, 42);
    }
}
