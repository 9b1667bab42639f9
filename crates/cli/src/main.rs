use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::stats::{self, DEFAULT_YEARS};
use data_loader::{join_genres, DataIndex, DataPaths, Genre, MovieId, RawDataset};
use miner::{MiningOutput, MiningParams, Rule};
use pipeline::{Analyzer, GenreAssociation, PipelineConfig, Recommendation};
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Genre Affinity - genre association rules and recommendations for MovieLens
#[derive(Parser)]
#[command(name = "genre-affinity")]
#[command(
    about = "Mine genre association rules from MovieLens and recommend movies",
    long_about = None
)]
struct Cli {
    /// Path to MovieLens dataset directory
    #[arg(short, long, default_value = "data/ml-20m", global = true)]
    data_dir: PathBuf,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Thresholds shared by every mining command
#[derive(Args, Debug, Clone, Copy)]
struct MiningArgs {
    /// Minimum itemset support, in (0, 1]
    #[arg(long, default_value_t = 0.005)]
    min_support: f64,

    /// Minimum rule confidence, in (0, 1]
    #[arg(long, default_value_t = 0.3)]
    min_confidence: f64,

    /// Minimum rule lift (0 keeps every rule)
    #[arg(long, default_value_t = 0.0)]
    min_lift: f64,

    /// Largest itemset size to search
    #[arg(long)]
    max_len: Option<usize>,
}

impl MiningArgs {
    fn params(&self) -> MiningParams {
        MiningParams {
            min_support: self.min_support,
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            max_len: self.max_len,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show table shapes, null counts and what preprocessing dropped
    Summary,

    /// Most-rated movies, rating distribution and genre counts
    Explore {
        /// First year of the window (inclusive)
        #[arg(long, default_value_t = *DEFAULT_YEARS.start())]
        from_year: i32,

        /// Last year of the window (inclusive)
        #[arg(long, default_value_t = *DEFAULT_YEARS.end())]
        to_year: i32,

        /// Number of most-rated movies to show
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// List frequent genre itemsets
    Itemsets {
        #[command(flatten)]
        mining: MiningArgs,

        /// Number of itemsets to show
        #[arg(long, default_value = "50")]
        top: usize,
    },

    /// List association rules, highest lift first
    Rules {
        #[command(flatten)]
        mining: MiningArgs,

        /// Number of rules to show
        #[arg(long, default_value = "50")]
        top: usize,
    },

    /// Recommend movies related to a movie's genres
    Recommend {
        /// Movie ID to get recommendations for
        #[arg(long)]
        movie_id: MovieId,

        #[command(flatten)]
        mining: MiningArgs,

        /// Number of recommendations to return
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Skip movies with fewer ratings than this
        #[arg(long, default_value = "0")]
        min_ratings: u32,
    },

    /// Show the genres most associated with one genre
    Associations {
        /// Genre name, e.g. "Sci-Fi"
        #[arg(long)]
        genre: String,

        #[command(flatten)]
        mining: MiningArgs,

        /// Number of rules to show
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        #[command(flatten)]
        mining: MiningArgs,

        /// Number of recommendations per request
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let data_dir = cli.data_dir;

    // Summary needs the raw tables, everything else the cleaned index
    let load = || load_analyzer(&data_dir);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Summary => handle_summary(&data_dir, json)?,
        Commands::Explore {
            from_year,
            to_year,
            top,
        } => handle_explore(load()?.data_index(), from_year, to_year, top, json)?,
        Commands::Itemsets { mining, top } => {
            let output = load()?.mine(&mining.params())?;
            handle_itemsets(&output, top, json)?
        }
        Commands::Rules { mining, top } => {
            let output = load()?.mine(&mining.params())?;
            handle_rules(&output, top, json)?
        }
        Commands::Recommend {
            movie_id,
            mining,
            count,
            min_ratings,
        } => {
            let config = PipelineConfig::new(mining.params())
                .with_recommendation_count(count)
                .with_min_rating_count(min_ratings);
            handle_recommend(&mut load()?, movie_id, &config, json)?
        }
        Commands::Associations { genre, mining, top } => {
            let association = load()?.associations(&Genre::new(genre), &mining.params(), top)?;
            handle_associations(&association, json)?
        }
        Commands::Benchmark {
            requests,
            mining,
            count,
        } => {
            let config = PipelineConfig::new(mining.params()).with_recommendation_count(count);
            handle_benchmark(&load()?, requests, &config, json)?
        }
    }

    Ok(())
}

/// Load the dataset and build the genre matrix, reporting progress on stderr
fn load_analyzer(data_dir: &Path) -> Result<Analyzer> {
    eprintln!("Loading MovieLens dataset from {}...", data_dir.display());
    let start = Instant::now();
    let analyzer = Analyzer::load(data_dir).context("Failed to load MovieLens dataset")?;
    let (movies, ratings, tags) = analyzer.data_index().counts();
    eprintln!(
        "{} Loaded {} movies, {} ratings, {} tags in {:?}",
        "✓".green(),
        movies,
        ratings,
        tags,
        start.elapsed()
    );
    Ok(analyzer)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_no_results(what: &str) {
    println!("{}", format!("No {} for these parameters.", what).yellow());
}

/// Handle the 'summary' command
fn handle_summary(data_dir: &Path, json: bool) -> Result<()> {
    let raw = RawDataset::load(&DataPaths::from_dir(data_dir))
        .context("Failed to load MovieLens dataset")?;
    let (index, report) = data_loader::preprocess::preprocess(&raw);

    if json {
        #[derive(Serialize)]
        struct Summary<'a> {
            tables: Vec<&'a data_loader::TableSummary>,
            preprocessing: &'a data_loader::PreprocessReport,
            genres: Vec<Genre>,
        }
        return print_json(&Summary {
            tables: raw.summaries(),
            preprocessing: &report,
            genres: index.genres().into_iter().collect(),
        });
    }

    println!("{}", "Tables:".bold().blue());
    for summary in raw.summaries() {
        println!(
            "{} {}: {} rows x {} columns, {} nulls, {} malformed rows",
            "•".green(),
            summary.file,
            summary.rows,
            summary.num_columns(),
            summary.total_nulls(),
            summary.malformed_rows
        );
        for column in summary.null_counts.iter().filter(|c| c.nulls > 0) {
            println!("    {}: {} nulls", column.column, column.nulls);
        }
    }

    println!("{}", "Preprocessing:".bold().blue());
    let tables = [&report.movies, &report.ratings, &report.tags]
        .into_iter()
        .chain(report.links.as_ref());
    for table in tables {
        println!(
            "{} {}: kept {} of {} rows ({} dropped, {} values filled)",
            "•".cyan(),
            table.table,
            table.rows_kept,
            table.rows_in,
            table.rows_dropped,
            table.values_filled
        );
    }

    let genres = index.genres();
    println!(
        "{} {} genres: {}",
        "•".cyan(),
        genres.len(),
        join_genres(&genres)
    );
    Ok(())
}

/// Handle the 'explore' command
fn handle_explore(
    index: &Arc<DataIndex>,
    from_year: i32,
    to_year: i32,
    top: usize,
    json: bool,
) -> Result<()> {
    if from_year > to_year {
        bail!("--from-year {} is after --to-year {}", from_year, to_year);
    }
    let years = from_year..=to_year;

    let most_rated = stats::most_rated_movies(index, years.clone(), top);
    let distribution = stats::rating_distribution(index, years.clone());
    let per_year = stats::ratings_per_year(index, years);
    let change = stats::year_over_year(&per_year);
    let genres = stats::genre_distribution(index);

    if json {
        #[derive(Serialize)]
        struct Exploration<'a> {
            from_year: i32,
            to_year: i32,
            most_rated: &'a [stats::MovieRatingCount],
            rating_distribution: &'a stats::RatingDistribution,
            ratings_per_year: &'a [stats::YearCount],
            year_over_year: Option<stats::YearOverYear>,
            genre_distribution: &'a [stats::GenreCount],
        }
        return print_json(&Exploration {
            from_year,
            to_year,
            most_rated: &most_rated,
            rating_distribution: &distribution,
            ratings_per_year: &per_year,
            year_over_year: change,
            genre_distribution: &genres,
        });
    }

    println!(
        "{}",
        format!("Most rated movies, {}-{}:", from_year, to_year).bold().blue()
    );
    if most_rated.is_empty() {
        print_no_results("ratings");
    }
    for (rank, movie) in most_rated.iter().enumerate() {
        println!(
            "{}. {} ({} ratings)",
            (rank + 1).to_string().green(),
            movie.title,
            movie.ratings_count
        );
    }

    println!("{}", "Rating distribution:".bold().blue());
    for bucket in &distribution.buckets {
        println!("  {:>3.1}: {}", bucket.rating, bucket.count);
    }
    if let Some(most_common) = distribution.most_common {
        println!("{} Most common rating: {:.1}", "•".cyan(), most_common.rating);
    }
    if let Some(mean) = distribution.mean {
        println!("{} Mean rating: {:.2}", "•".cyan(), mean);
    }
    if let Some(skewness) = distribution.skewness {
        println!("{} Skewness: {:.3}", "•".cyan(), skewness);
    }

    println!("{}", "Ratings per year:".bold().blue());
    for year in &per_year {
        println!("  {}: {}", year.year, year.ratings_count);
    }
    if let Some(change) = change {
        match change.percent_change {
            Some(pct) => println!(
                "{} {} vs previous year: {:+.1}%",
                "•".cyan(),
                change.latest_year,
                pct
            ),
            None => println!(
                "{} {}: no previous year to compare",
                "•".cyan(),
                change.latest_year
            ),
        }
    }

    println!("{}", "Movies per genre:".bold().blue());
    for genre in &genres {
        println!("  {}: {}", genre.genre, genre.count);
    }
    Ok(())
}

/// Handle the 'itemsets' command
fn handle_itemsets(output: &MiningOutput, top: usize, json: bool) -> Result<()> {
    let itemsets = output.itemsets.itemsets();
    let shown = &itemsets[..top.min(itemsets.len())];
    if json {
        return print_json(&shown);
    }

    println!(
        "{}",
        format!(
            "{} frequent itemsets (min support {}):",
            itemsets.len(),
            output.params.min_support
        )
        .bold()
        .blue()
    );
    if itemsets.is_empty() {
        print_no_results("frequent itemsets");
    }
    for itemset in shown {
        println!(
            "{:>8.4}  {}",
            itemset.support,
            join_genres(&itemset.genres)
        );
    }
    Ok(())
}

/// Handle the 'rules' command
fn handle_rules(output: &MiningOutput, top: usize, json: bool) -> Result<()> {
    let shown = &output.rules[..top.min(output.rules.len())];
    if json {
        #[derive(Serialize)]
        struct RuleTable<'a> {
            summary: Option<miner::RuleSummary>,
            rules: &'a [Rule],
        }
        return print_json(&RuleTable {
            summary: output.summary(),
            rules: shown,
        });
    }

    if output.rules.is_empty() {
        print_no_results("association rules");
        return Ok(());
    }
    print_rules(shown);
    if let Some(summary) = output.summary() {
        println!(
            "{} {} rules, mean support {:.4}, mean confidence {:.3}, mean lift {:.3}",
            "•".cyan(),
            summary.count,
            summary.mean_support,
            summary.mean_confidence,
            summary.mean_lift
        );
    }
    if let Some(best) = output.rules.first() {
        println!(
            "{} Top rule: {} => {} is {:.2}x more likely than chance",
            "•".cyan(),
            join_genres(&best.antecedent),
            join_genres(&best.consequent),
            best.lift
        );
    }
    Ok(())
}

fn print_rules(rules: &[Rule]) {
    println!(
        "{}",
        format!(
            "{:<30} {:<30} {:>8} {:>10} {:>6} {:>9} {:>10}",
            "antecedent", "consequent", "support", "confidence", "lift", "leverage", "conviction"
        )
        .bold()
        .blue()
    );
    for rule in rules {
        println!(
            "{:<30} {:<30} {:>8.4} {:>10.3} {:>6.3} {:>9.4} {:>10.3}",
            join_genres(&rule.antecedent),
            join_genres(&rule.consequent),
            rule.support,
            rule.confidence,
            rule.lift,
            rule.leverage,
            rule.conviction
        );
    }
}

/// Handle the 'recommend' command
fn handle_recommend(
    analyzer: &mut Analyzer,
    movie_id: MovieId,
    config: &PipelineConfig,
    json: bool,
) -> Result<()> {
    let analysis = analyzer.run(movie_id, config)?;
    if json {
        return print_json(&analysis);
    }

    if let Some(movie) = analyzer.data_index().get_movie(movie_id) {
        println!(
            "{} {} [{}]",
            "Query:".bold(),
            movie.title,
            join_genres(&movie.genres)
        );
    }
    println!(
        "{} {} itemsets, {} rules",
        "•".cyan(),
        analysis.num_itemsets,
        analysis.num_rules
    );

    if analysis.recommendations.is_empty() {
        print_no_results("recommendations");
        return Ok(());
    }
    print_recommendations(&analysis.recommendations);
    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Recommendation]) {
    println!("{}", "Movie Recommendations:".bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} (id {}) [{}] - matched: {} - avg {:.2} ({} ratings)",
            (i + 1).to_string().green(),
            rec.title,
            rec.movie_id,
            join_genres(&rec.genres),
            join_genres(&rec.matched_genres).yellow(),
            rec.avg_rating,
            rec.rating_count
        );
    }
}

/// Handle the 'associations' command
fn handle_associations(association: &GenreAssociation, json: bool) -> Result<()> {
    if json {
        return print_json(association);
    }

    println!(
        "{}",
        format!("Rules involving {}:", association.genre).bold().blue()
    );
    if association.rules.is_empty() {
        print_no_results("rules");
        return Ok(());
    }
    print_rules(&association.rules);
    println!(
        "{} Movies of genre {} also tend to be: {}",
        "•".cyan(),
        association.genre,
        join_genres(&association.associated_genres)
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct BenchmarkReport {
    requests: usize,
    #[serde(with = "duration_millis")]
    total: Duration,
    #[serde(with = "duration_millis")]
    mean: Duration,
    #[serde(with = "duration_millis")]
    p50: Duration,
    #[serde(with = "duration_millis")]
    p95: Duration,
    #[serde(with = "duration_millis")]
    p99: Duration,
    throughput: f64,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }
}

/// Handle the 'benchmark' command
///
/// Every request mines afresh so the timings include Apriori.
fn handle_benchmark(
    analyzer: &Analyzer,
    requests: usize,
    config: &PipelineConfig,
    json: bool,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    config.validate()?;

    let movie_ids = analyzer.data_index().all_movie_ids();
    let mut rng = rand::rng();
    let picks: Vec<MovieId> = (0..requests)
        .filter_map(|_| movie_ids.choose(&mut rng).copied())
        .collect();
    if picks.is_empty() {
        bail!("Dataset has no movies to benchmark");
    }

    let started = Instant::now();
    let mut timings = Vec::with_capacity(picks.len());
    for movie_id in picks {
        let start = Instant::now();
        analyzer.recommend_uncached(movie_id, config)?;
        timings.push(start.elapsed());
    }
    let total = started.elapsed();

    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let report = BenchmarkReport {
        requests: timings.len(),
        total,
        mean: timings.iter().sum::<Duration>() / timings.len() as u32,
        p50: percentile(0.50),
        p95: percentile(0.95),
        p99: percentile(0.99),
        throughput: timings.len() as f64 / total.as_secs_f64(),
    };

    if json {
        return print_json(&report);
    }

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {}", report.requests);
    println!("Total time: {:?}", report.total);
    println!("Average latency: {:?}", report.mean);
    println!("P50 latency: {:?}", report.p50);
    println!("P95 latency: {:?}", report.p95);
    println!("P99 latency: {:?}", report.p99);
    println!("Throughput: {:.2} requests/second", report.throughput);
    Ok(())
}
