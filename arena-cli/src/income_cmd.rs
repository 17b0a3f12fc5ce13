//! Income command - passive income and attribute upgrade costs for a stable

use anyhow::{Context, Result};
use clap::Args;

use arena_league::{LeagueConfig, RewardCalculator};

use crate::print_json;

#[derive(Args)]
pub struct IncomeArgs {
    /// Income generator level (0-10)
    #[arg(long, default_value = "0")]
    pub level: u32,

    /// Stable prestige
    #[arg(long, default_value = "0")]
    pub prestige: u32,

    /// Also price upgrading an attribute from this level
    #[arg(long)]
    pub attribute_level: Option<u32>,

    /// Training facility level used for the upgrade discount
    #[arg(long, default_value = "0")]
    pub training: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(serde::Serialize)]
struct IncomeReport {
    income_generator_level: u32,
    prestige: u32,
    merchandising: u32,
    total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    upgrade_cost: Option<u32>,
}

pub fn run(args: IncomeArgs, config: &LeagueConfig) -> Result<()> {
    let calculator = RewardCalculator::new(config.economy.clone());
    let report = build_report(&args, &calculator)?;

    if args.json {
        print_json(&report)
    } else {
        println!("\n=== Passive Income ===");
        println!("Income generator: level {}", report.income_generator_level);
        println!("Prestige:         {}", report.prestige);
        println!("Merchandising:    {}", report.merchandising);
        println!("Total:            {}", report.total);
        if let (Some(cost), Some(level)) = (report.upgrade_cost, args.attribute_level) {
            println!("Upgrade {} -> {}:    {} (training level {})", level, level + 1, cost, args.training);
        }
        Ok(())
    }
}

fn build_report(args: &IncomeArgs, calculator: &RewardCalculator) -> Result<IncomeReport> {
    let income = calculator
        .passive_income(args.level, args.prestige)
        .context("Failed to compute passive income")?;

    let upgrade_cost = args
        .attribute_level
        .map(|level| calculator.table().attribute_upgrade_cost(level, args.training))
        .transpose()
        .context("Failed to price attribute upgrade")?;

    Ok(IncomeReport {
        income_generator_level: args.level,
        prestige: args.prestige,
        merchandising: income.merchandising,
        total: income.total,
        upgrade_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(level: u32, prestige: u32) -> IncomeArgs {
        IncomeArgs {
            level,
            prestige,
            attribute_level: None,
            training: 0,
            json: false,
        }
    }

    #[test]
    fn test_income_report() {
        let report = build_report(&args(4, 10_000), &RewardCalculator::default()).unwrap();
        // 12000 * 2.0
        assert_eq!(report.merchandising, 24_000);
        assert_eq!(report.total, 24_000);
        assert_eq!(report.upgrade_cost, None);
    }

    #[test]
    fn test_upgrade_cost() {
        let mut a = args(0, 0);
        a.attribute_level = Some(9);
        a.training = 4;
        let report = build_report(&a, &RewardCalculator::default()).unwrap();
        // 10 * 1000 * 0.80
        assert_eq!(report.upgrade_cost, Some(8_000));
    }

    #[test]
    fn test_invalid_levels() {
        assert!(build_report(&args(11, 0), &RewardCalculator::default()).is_err());
        let mut a = args(0, 0);
        a.attribute_level = Some(50);
        assert!(build_report(&a, &RewardCalculator::default()).is_err());
    }
}
