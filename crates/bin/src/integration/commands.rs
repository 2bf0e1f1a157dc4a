//! View commands shared by the one-shot CLI and the shell.

use super::present::{self, OutputSettings};
use clap::{Args, Subcommand};
use credence::{DashboardContext, RenderedView, SelectionState, View, render};
use credence_cohort::NeighborCount;
use credence_data::{FilterValue, TableFilters};
use credence_output::charts::DEFAULT_TOP_FEATURES;
use std::path::PathBuf;

/// Commands that render a view.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ViewCommand {
    /// Filterable client listing
    Table(TableArgs),

    /// Default probability, decision and attribution of one client
    Score(ScoreArgs),

    /// One client against its nearest neighbours or the full population
    Compare(CompareArgs),

    /// List the client identifiers that can be selected
    Clients(ClientsArgs),
}

/// Client table filters; "All" disables a filter.
#[derive(Args, Debug, Clone)]
pub(crate) struct TableArgs {
    /// Gender code
    #[arg(long, default_value = "All")]
    pub(crate) gender: FilterValue,

    /// Age in years
    #[arg(long, default_value = "All")]
    pub(crate) age: FilterValue,

    /// Family status
    #[arg(long, default_value = "All")]
    pub(crate) family_status: FilterValue,

    /// Number of children
    #[arg(long, default_value = "All")]
    pub(crate) children: FilterValue,

    /// Income type
    #[arg(long, default_value = "All")]
    pub(crate) income_type: FilterValue,

    /// Education level
    #[arg(long, default_value = "All")]
    pub(crate) education: FilterValue,

    /// Rows printed in text mode
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,

    /// Write the matching rows to a .csv or .json file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

impl TableArgs {
    pub(crate) fn filters(&self) -> TableFilters {
        TableFilters {
            gender: self.gender.clone(),
            age: self.age.clone(),
            family_status: self.family_status.clone(),
            children: self.children.clone(),
            income_type: self.income_type.clone(),
            education: self.education.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ScoreArgs {
    /// Client identifier
    pub(crate) client: i64,

    /// Contributions listed in text mode
    #[arg(long, default_value_t = DEFAULT_TOP_FEATURES)]
    pub(crate) top: usize,

    /// Write the score and contributions to a .csv or .json file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct CompareArgs {
    /// Client identifier
    pub(crate) client: i64,

    /// Neighbour group size
    #[arg(short = 'k', long, default_value_t = NeighborCount::DEFAULT)]
    pub(crate) neighbors: usize,

    /// Compare against every client instead of the neighbours
    #[arg(long)]
    pub(crate) all: bool,

    /// Rows printed in text mode
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,

    /// Write the cohort rows to a .csv or .json file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ClientsArgs {
    /// Identifiers printed in text mode
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,
}

impl ViewCommand {
    /// Selection this command asks for.
    pub(crate) fn selection(&self) -> Result<SelectionState, Box<dyn std::error::Error>> {
        Ok(match self {
            Self::Table(args) => SelectionState::default().with_filters(args.filters()),
            Self::Score(args) => SelectionState::default().with_client(args.client),
            Self::Compare(args) => SelectionState::default()
                .with_client(args.client)
                .with_neighbors(NeighborCount::try_from(args.neighbors)?)
                .with_full_population(args.all),
            Self::Clients(_) => SelectionState::default(),
        })
    }
}

/// Render the command's view and present it.
pub(crate) fn execute(
    ctx: &DashboardContext,
    command: &ViewCommand,
    settings: &OutputSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = command.selection()?;
    match command {
        ViewCommand::Table(args) => {
            if let RenderedView::Table(table) = render(ctx, View::ClientTable, &selection)? {
                present::table(ctx, &table, args, settings)?;
            }
        }
        ViewCommand::Score(args) => {
            if let RenderedView::Score(score) = render(ctx, View::ScoreVisualization, &selection)? {
                present::score(ctx, &score, args, settings)?;
            }
        }
        ViewCommand::Compare(args) => {
            if let RenderedView::Comparison(comparison) =
                render(ctx, View::ClientComparison, &selection)?
            {
                present::comparison(ctx, &comparison, args, settings)?;
            }
        }
        ViewCommand::Clients(args) => present::clients(ctx, args.limit, settings)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use credence::cohort::CohortScope;
    use rstest::rstest;

    #[derive(Parser)]
    #[command(no_binary_name = true)]
    struct Line {
        #[command(subcommand)]
        command: ViewCommand,
    }

    fn parse(args: &[&str]) -> ViewCommand {
        Line::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_table_filters_default_to_wildcard() {
        let ViewCommand::Table(args) = parse(&["table"]) else {
            panic!("expected table");
        };
        assert_eq!(args.filters(), TableFilters::default());
    }

    #[test]
    fn test_table_filters_from_flags() {
        let ViewCommand::Table(args) =
            parse(&["table", "--gender", "F", "--family-status", "Single / not married"])
        else {
            panic!("expected table");
        };
        let filters = args.filters();
        assert_eq!(filters.gender, FilterValue::equals("F"));
        assert_eq!(filters.family_status, FilterValue::equals("Single / not married"));
        assert!(filters.education.is_wildcard());
    }

    #[test]
    fn test_compare_selection() {
        let command = parse(&["compare", "100002", "-k", "50", "--all"]);
        let selection = command.selection().unwrap();
        assert_eq!(selection.client, Some(100002));
        assert_eq!(selection.neighbors.get(), 50);
        assert_eq!(selection.scope(), CohortScope::FullPopulation);
    }

    #[rstest]
    #[case("9")]
    #[case("1001")]
    fn test_compare_rejects_out_of_range_neighbors(#[case] k: &str) {
        let command = parse(&["compare", "100002", "--neighbors", k]);
        assert!(command.selection().is_err());
    }

    #[test]
    fn test_compare_default_neighbors() {
        let selection = parse(&["compare", "100002"]).selection().unwrap();
        assert_eq!(selection.neighbors, NeighborCount::default());
        assert_eq!(selection.neighbors.get(), NeighborCount::DEFAULT);
        assert!(!selection.full_population);
    }

    #[test]
    fn test_clients_selects_nothing() {
        assert_eq!(parse(&["clients"]).selection().unwrap(), SelectionState::default());
    }
}
