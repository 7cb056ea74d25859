use std::{env, fs, io::{self, BufRead, Write}, process::ExitCode, time::Instant};

use log::LevelFilter;
use log4rs::{append::console::{ConsoleAppender, Target}, config::{Appender, Logger, Root}, encode::pattern::PatternEncoder, Config};
use svd_topic_model::{Document, ModelConfig, TopicModel, TopicModelError};

struct Args {
    corpus: String,
    config: Option<String>,
    rank: Option<usize>,
    clusters: Option<usize>,
    seed: Option<u64>,
    query: Option<String>,
    snapshot: Option<String>,
    verbose: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut args = env::args().skip(1); // program 名除外
    let mut parsed = Args {
        corpus: String::from("data/corpus.json"),
        config: None,
        rank: None,
        clusters: None,
        seed: None,
        query: None,
        snapshot: None,
        verbose: false,
    };
    while let Some(a) = args.next() {
        match a.as_str() {
            "--corpus" => parsed.corpus = args.next().ok_or("--corpus requires a path")?,
            "--config" => parsed.config = Some(args.next().ok_or("--config requires a path")?),
            "--rank" => parsed.rank = Some(parse_number(args.next(), "--rank")?),
            "--clusters" => parsed.clusters = Some(parse_number(args.next(), "--clusters")?),
            "--seed" => parsed.seed = Some(parse_number(args.next(), "--seed")?),
            "--query" => parsed.query = Some(args.next().ok_or("--query requires a string")?),
            "--snapshot" => parsed.snapshot = Some(args.next().ok_or("--snapshot requires a path")?),
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(Some(parsed))
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, flag: &str) -> Result<T, String> {
    value
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| format!("{} requires a non-negative integer", flag))
}

fn print_usage() {
    eprintln!("Usage: svd-topic-model [--corpus FILE] [--config FILE] [--rank K] [--clusters N] [--seed S]");
    eprintln!("                       [--query \"W\" | --query \"W1 W2 W3\"] [--snapshot FILE] [--verbose]");
    eprintln!("The corpus is a JSON array of {{\"id\": ..., \"tokens\": [...]}} documents.");
    eprintln!("One query word lists similar words, three words run the analogy W1 - W2 + W3.");
    eprintln!("If --query omitted, queries are read from stdin. Output format: <similarity>\\t<word>");
}

fn configure_logging(verbose: bool) {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {m}{n}")))
        .build();
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(console)))
        .logger(Logger::builder().build("svd_topic_model", level))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("[warn] logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("[warn] logging disabled: {}", e),
    }
}

fn load_corpus(path: &str) -> Result<Vec<Document>, String> {
    let json = fs::read_to_string(path).map_err(|e| format!("cannot read corpus {}: {}", path, e))?;
    serde_json::from_str(&json).map_err(|e| format!("corpus {} is not a document array: {}", path, e))
}

fn main() -> ExitCode {
    let program_start = Instant::now();
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[error] {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    configure_logging(args.verbose);

    match run(&args) {
        Ok(()) => {
            eprintln!("[time] program_total={:.2}ms", program_start.elapsed().as_secs_f64() * 1000.0);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[error] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => ModelConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ModelConfig::default(),
    };
    if let Some(rank) = args.rank {
        config = config.with_rank(rank);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    // ---- 文書ロード ----
    let load_start = Instant::now();
    let corpus = load_corpus(&args.corpus)?;
    eprintln!("[info] loaded {} documents from {}", corpus.len(), args.corpus);

    let fit_start = Instant::now();
    let model = TopicModel::fit(&corpus, &config).map_err(|e| e.to_string())?;
    let fit_done = Instant::now();
    eprintln!(
        "[time] load_corpus={:.2}ms fit={:.2}ms",
        fit_start.duration_since(load_start).as_secs_f64() * 1000.0,
        fit_done.duration_since(fit_start).as_secs_f64() * 1000.0
    );
    eprintln!("[info] singular values: {:?}", model.singular_values().to_vec());

    // ---- クラスタリング ----
    let mut document_clusters = None;
    let mut word_clusters = None;
    if let Some(k) = args.clusters {
        let docs = model.cluster_documents(k).map_err(|e| e.to_string())?;
        for (label, group) in model.document_clusters(&corpus, &docs).map_err(|e| e.to_string())?.iter().enumerate() {
            let ids: Vec<&str> = group.iter().map(|doc| doc.id.as_str()).collect();
            println!("doc-cluster {}\t{}", label, ids.join(" "));
        }
        let words = model.cluster_words(k).map_err(|e| e.to_string())?;
        for (label, group) in model.word_clusters(&words).map_err(|e| e.to_string())?.iter().enumerate() {
            println!("word-cluster {}\t{}", label, group.join(" "));
        }
        document_clusters = Some(docs);
        word_clusters = Some(words);
    }

    if let Some(path) = &args.snapshot {
        let bytes = model
            .to_data(document_clusters.as_ref(), word_clusters.as_ref())
            .to_cbor()
            .map_err(|e| e.to_string())?;
        fs::write(path, &bytes).map_err(|e| format!("cannot write snapshot {}: {}", path, e))?;
        eprintln!("[info] snapshot written to {} ({} bytes)", path, bytes.len());
    }

    // ---- モード判定: --query 指定時はその1回だけ、未指定なら対話ループ ----
    match &args.query {
        Some(query) => run_single_query(&model, query),
        None => {
            run_interactive(&model);
            Ok(())
        }
    }
}

/// 1語なら類似語、3語なら analogy
fn answer(model: &TopicModel, line: &str) -> Result<String, TopicModelError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let hits = match words.as_slice() {
        [word] => model.similar_words(word)?,
        [w1, w2, w3] => model.analogy(w1, w2, w3)?,
        _ => {
            return Err(TopicModelError::InvalidInput(format!(
                "expected 1 or 3 words, got {}",
                words.len()
            )))
        }
    };
    Ok(hits.to_string())
}

fn run_single_query(model: &TopicModel, query: &str) -> Result<(), String> {
    let t0 = Instant::now();
    let out = answer(model, query).map_err(|e| e.to_string())?;
    eprintln!("[time] query={:.2}ms", t0.elapsed().as_secs_f64() * 1000.0);
    print!("{}", out);
    Ok(())
}

fn run_interactive(model: &TopicModel) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("Query> ");
        let _ = stdout.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("[error] read error: {}", e);
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        let start = Instant::now();
        match answer(model, trimmed) {
            Ok(out) => {
                eprintln!("[time] query={:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
                print!("{}", out);
            }
            // 語彙外や語数違いはループを続ける
            Err(e) => eprintln!("[warn] {}", e),
        }
    }
    eprintln!("[info] bye");
}
