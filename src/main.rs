use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use cid3_io::{CasesReader, CasesWriter, DataFiles, RuleWriter, scored_cases_path};
use cid3_tree::{
    Classifier, Criterion, CrossValidation, CrossValidationResult, Dataset, ErrorReport,
    FoldModel, ForestConfig, Model, RuleTree, TreeConfig, TreeStats,
};

#[derive(Parser)]
#[command(name = "cid3")]
#[command(about = "Decision trees and random-subspace forests for mixed discrete/continuous data")]
#[command(version)]
struct Cli {
    /// Path to the data file; `.names`, `.test`, `.tree` and `.forest` are derived from it
    #[arg(short, long)]
    file: PathBuf,

    /// Split criterion: c (certainty), e (entropy), or g (gini)
    #[arg(short, long, default_value = "c")]
    criterion: String,

    /// Hold out 20% of the training rows when there is no test file
    #[arg(short, long)]
    partition: bool,

    /// Run 10-fold cross-validation
    #[arg(short, long)]
    validation: bool,

    /// Grow a random-subspace forest of N trees
    #[arg(short = 'r', long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    forest: Option<usize>,

    /// Train on all rows and save the model next to the data file
    #[arg(short, long)]
    save: bool,

    /// Export the saved tree as JSON rules to this path
    #[arg(long, requires = "save")]
    rules: Option<PathBuf>,

    /// Load a saved model and classify cases instead of training
    #[arg(short, long, value_enum)]
    query: Option<ModelKind>,

    /// Cases file to classify in query mode
    #[arg(short, long, value_name = "CASES", requires = "query")]
    output: Option<PathBuf>,

    /// Single case to classify in query mode, as comma-separated values
    #[arg(short, long, requires = "query", conflicts_with = "output")]
    example: Option<String>,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = cid3_tree::DEFAULT_SEED)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelKind {
    Tree,
    Forest,
}

impl ModelKind {
    fn extension(self) -> &'static str {
        match self {
            ModelKind::Tree => "tree",
            ModelKind::Forest => "forest",
        }
    }
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    criterion: String,
    mode: &'static str,
    n_train: usize,
    n_test: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<TreeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n_trees: Option<usize>,
    train: ErrorOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rules_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct ErrorOutput {
    correct: usize,
    incorrect: usize,
    error_percent: f64,
}

impl From<ErrorReport> for ErrorOutput {
    fn from(report: ErrorReport) -> Self {
        Self {
            correct: report.correct,
            incorrect: report.incorrect,
            error_percent: report.error_percent(),
        }
    }
}

#[derive(Serialize)]
struct ValidationOutput {
    criterion: String,
    mode: &'static str,
    n_rows: usize,
    model: FoldModel,
    #[serde(flatten)]
    result: CrossValidationResult,
}

#[derive(Serialize)]
struct QueryOutput {
    model_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    cases: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

fn fit_classifier(
    dataset: &Dataset,
    criterion: Criterion,
    forest: Option<usize>,
    seed: u64,
) -> Result<Classifier> {
    let rows = dataset.train_rows();
    let classifier = match forest {
        Some(n_trees) => Classifier::Forest(
            ForestConfig::new(n_trees)?
                .with_criterion(criterion)
                .with_seed(seed)
                .fit(dataset, rows)
                .context("forest training failed")?,
        ),
        None => Classifier::Tree(
            TreeConfig::new()
                .with_criterion(criterion)
                .with_seed(seed)
                .fit(dataset, rows)
                .context("tree training failed")?,
        ),
    };
    Ok(classifier)
}

fn tree_stats(classifier: &Classifier) -> Option<TreeStats> {
    match classifier {
        Classifier::Tree(tree) => Some(TreeStats::of(tree)),
        Classifier::Forest(_) => None,
    }
}

fn forest_size(classifier: &Classifier) -> Option<usize> {
    match classifier {
        Classifier::Tree(_) => None,
        Classifier::Forest(forest) => Some(forest.n_trees()),
    }
}

fn run_query(cli: &Cli, kind: ModelKind, files: &DataFiles) -> Result<()> {
    let model_path = files.model(kind.extension());
    let mut model = Model::load(&model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;

    let output = if let Some(cases) = &cli.output {
        let scored = CasesReader::new(cases)
            .score(&mut model)
            .context("failed to classify cases")?;
        let out = scored_cases_path(cases);
        CasesWriter::new(&out).write(&scored)?;
        QueryOutput {
            model_path,
            cases: Some(scored.len()),
            output_path: Some(out),
            label: None,
        }
    } else if let Some(example) = &cli.example {
        let fields: Vec<&str> = example.split(',').map(str::trim).collect();
        let label = model
            .classify_case(&fields)
            .context("failed to classify example")?;
        info!(label = %label, "example classified");
        QueryOutput {
            model_path,
            cases: None,
            output_path: None,
            label: Some(label.to_string()),
        }
    } else {
        bail!("query mode needs --output CASES or --example VALUES");
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let criterion: Criterion = cli.criterion.parse()?;
    let files = DataFiles::new(&cli.file);

    if let Some(kind) = cli.query {
        return run_query(&cli, kind, &files);
    }

    let mut dataset = files
        .load()
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    if cli.validation {
        dataset.merge_test_into_train();
        dataset.impute();
        let mut cv = CrossValidation::new()
            .with_criterion(criterion)
            .with_seed(cli.seed);
        if let Some(n_trees) = cli.forest {
            cv = cv.with_forest(n_trees)?;
        }
        let result = cv.evaluate(&dataset).context("cross-validation failed")?;

        let output = ValidationOutput {
            criterion: criterion.to_string(),
            mode: "validation",
            n_rows: dataset.train_rows().len(),
            model: cv.model(),
            result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if cli.save {
        dataset.merge_test_into_train();
        let imputation = dataset.impute();
        let classifier = fit_classifier(&dataset, criterion, cli.forest, cli.seed)?;

        let rules_path = match (&cli.rules, &classifier) {
            (Some(path), Classifier::Tree(tree)) => {
                let rules = RuleTree::from_tree(tree, dataset.schema(), dataset.domains())?;
                RuleWriter::new(path).write(&rules)?;
                Some(path.clone())
            }
            (Some(_), Classifier::Forest(_)) => bail!("--rules applies to a single tree only"),
            (None, _) => None,
        };

        let train = classifier.errors(&dataset, dataset.train_rows());
        let n_train = dataset.train_rows().len();
        let tree = tree_stats(&classifier);
        let n_trees = forest_size(&classifier);
        let model_path = files.model(classifier.extension());
        let model = Model::new(dataset, imputation, classifier);
        model
            .save(&model_path)
            .with_context(|| format!("failed to save model {}", model_path.display()))?;

        let output = TrainOutput {
            criterion: criterion.to_string(),
            mode: "save",
            n_train,
            n_test: 0,
            tree,
            n_trees,
            train: train.into(),
            test: None,
            model_path: Some(model_path),
            rules_path,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !dataset.has_test() && cli.partition {
        dataset.partition(cli.seed);
    }
    dataset.impute();
    let classifier = fit_classifier(&dataset, criterion, cli.forest, cli.seed)?;

    let train = classifier.errors(&dataset, dataset.train_rows());
    let test = dataset
        .has_test()
        .then(|| classifier.errors(&dataset, dataset.test_rows()).into());
    info!(
        train_error = train.error_percent(),
        n_test = dataset.test_rows().len(),
        "evaluation complete"
    );

    let output = TrainOutput {
        criterion: criterion.to_string(),
        mode: classifier.extension(),
        n_train: dataset.train_rows().len(),
        n_test: dataset.test_rows().len(),
        tree: tree_stats(&classifier),
        n_trees: forest_size(&classifier),
        train: train.into(),
        test,
        model_path: None,
        rules_path: None,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
