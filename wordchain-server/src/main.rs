use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use wordchain_core::io::{list_files, normalize_folder};
use wordchain_core::model::options::DEFAULT_MAX_TOKENS;
use wordchain_core::{Chain, ChainError, ChainOptions, DeadEndPolicy};

/// Upper bound on the number of sentences of one `/v1/generate` call.
const MAX_COUNT: usize = 100;

/// Command-line configuration of the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "wordchain-server", about = "Serve sentences generated from a word chain")]
struct Config {
	/// Address to bind.
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to bind.
	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Directory holding the corpus files.
	#[arg(long, default_value = "./data")]
	data_dir: String,

	/// Extension of corpus files in the data directory.
	#[arg(long, default_value = "txt")]
	extension: String,

	/// Seed for every chain built by the server (entropy when absent).
	#[arg(long)]
	seed: Option<u64>,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	dead_end: Option<DeadEndPolicy>,
	max_tokens: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
}

struct SharedData {
	chain: Chain,
	corpora: Vec<String>,
	data_dir: PathBuf,
	extension: String,
	seed: Option<u64>,
}

impl SharedData {
	fn new(data_dir: PathBuf, extension: String, seed: Option<u64>) -> Self {
		Self {
			chain: Chain::with_options(ChainOptions::default(), seed),
			corpora: Vec::new(),
			data_dir,
			extension,
			seed,
		}
	}
}

impl GenerateParams {
	/// Builds the generation options of this request.
	fn options(&self) -> ChainOptions {
		ChainOptions {
			dead_end: self.dead_end.unwrap_or_default(),
			max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
		}
	}

	fn count(&self) -> Result<usize, String> {
		match self.count.unwrap_or(1) {
			0 => Err("count must be at least 1".into()),
			n if n > MAX_COUNT => Err(format!("count must be at most {MAX_COUNT}")),
			n => Ok(n),
		}
	}
}

/// Maps a chain error to the HTTP response reported to the caller.
fn error_response(error: &ChainError) -> HttpResponse {
	match error {
		ChainError::Untrained => HttpResponse::Conflict().body(error.to_string()),
		ChainError::DeadEnd { .. } => HttpResponse::UnprocessableEntity().body(error.to_string()),
		ChainError::SourceUnavailable { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
			HttpResponse::NotFound().body(error.to_string())
		}
		ChainError::SourceUnavailable { .. } => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` sentences with the shared chain, one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = match query.count() {
		Ok(n) => n,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let options = query.options();

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};

	let mut sentences = Vec::with_capacity(count);
	for _ in 0..count {
		match shared_data.chain.generate_sentence_with(&options) {
			Ok(sentence) => sentences.push(sentence),
			Err(e) => return error_response(&e),
		}
	}

	HttpResponse::Ok().body(sentences.join("\n"))
}

/// HTTP GET endpoint `/v1/corpora`
///
/// Lists the corpus names available in the data directory.
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let (data_dir, extension) = match data.lock() {
		Ok(m) => (m.data_dir.clone(), m.extension.clone()),
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};

	let suffix = format!(".{extension}");
	match list_files(&data_dir, &extension) {
		Ok(files) => {
			let names: Vec<&str> = files.iter().map(|f| f.strip_suffix(&suffix).unwrap_or(f.as_str())).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(e) => {
			warn!("cannot list {}: {}", data_dir.display(), e);
			HttpResponse::InternalServerError().body("Failed to list corpora")
		}
	}
}

/// HTTP GET endpoint `/v1/loaded_corpora`
///
/// Lists the corpora ingested into the current chain, in ingestion order.
#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	HttpResponse::Ok().body(shared_data.corpora.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_corpora?names=a,b`
///
/// Replaces the chain with a fresh one trained on the named corpora.
/// On failure the previous chain is kept.
#[put("/v1/load_corpora")]
async fn put_corpora(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let corpus_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();

	if corpus_names.iter().any(|name| name.contains(['/', '\\']) || name.starts_with('.')) {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};

	let mut chain = Chain::with_options(*shared_data.chain.options(), shared_data.seed);
	for name in &corpus_names {
		let corpus_path = shared_data.data_dir.join(format!("{}.{}", name, shared_data.extension));
		if let Err(e) = chain.add_from_file(&corpus_path) {
			return error_response(&e);
		}
	}

	info!("loaded corpora {:?} ({} tokens)", corpus_names, chain.word_count());
	shared_data.chain = chain;
	shared_data.corpora = corpus_names.iter().map(|s| s.to_string()).collect();

	HttpResponse::Ok().body("Corpora loaded successfully")
}

/// HTTP GET endpoint `/v1/chain`
///
/// Returns the successor table of the current chain.
#[get("/v1/chain")]
async fn get_chain(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Chain lock failed"),
	};
	HttpResponse::Ok().body(shared_data.chain.debug_dump())
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_corpora)
		.service(get_loaded_corpora)
		.service(put_corpora)
		.service(get_chain);
}

/// Main entry point for the server.
///
/// Wraps an empty chain in a `Mutex` so that requests are serialized, and
/// starts an Actix-web HTTP server. Corpora are loaded with `/v1/load_corpora`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::parse();
	let shared_data = SharedData::new(normalize_folder(&config.data_dir), config.extension.clone(), config.seed);
	let shared_chain = web::Data::new(Mutex::new(shared_data));

	info!("serving corpora from {} on {}:{}", config.data_dir, config.host, config.port);

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_chain.clone())
			.configure(configure)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use std::fs;

	fn shared(dir: &std::path::Path) -> web::Data<Mutex<SharedData>> {
		web::Data::new(Mutex::new(SharedData::new(dir.to_path_buf(), "txt".to_owned(), Some(9))))
	}

	async fn text(response: actix_web::dev::ServiceResponse) -> String {
		String::from_utf8(test::read_body(response).await.to_vec()).unwrap()
	}

	#[actix_web::test]
	async fn generate_before_loading_is_a_conflict() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared(dir.path())).configure(configure)).await;

		let request = test::TestRequest::get().uri("/v1/generate").to_request();
		let response = test::call_service(&app, request).await;
		assert_eq!(response.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn load_then_generate() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("fox.txt"), "The quick brown fox.\n").unwrap();
		fs::write(dir.path().join("dog.txt"), "The lazy dog.\n").unwrap();
		let app = test::init_service(App::new().app_data(shared(dir.path())).configure(configure)).await;

		let request = test::TestRequest::put().uri("/v1/load_corpora?names=fox").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

		let request = test::TestRequest::get().uri("/v1/generate?count=3").to_request();
		let response = test::call_service(&app, request).await;
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(text(response).await, "The quick brown fox.\nThe quick brown fox.\nThe quick brown fox.");

		let request = test::TestRequest::get().uri("/v1/loaded_corpora").to_request();
		assert_eq!(text(test::call_service(&app, request).await).await, "fox");

		let request = test::TestRequest::get().uri("/v1/corpora").to_request();
		assert_eq!(text(test::call_service(&app, request).await).await, "dog\nfox");
	}

	#[actix_web::test]
	async fn dead_end_policy_per_request() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("open.txt"), "hello world\n").unwrap();
		let app = test::init_service(App::new().app_data(shared(dir.path())).configure(configure)).await;

		let request = test::TestRequest::put().uri("/v1/load_corpora?names=open").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

		let request = test::TestRequest::get().uri("/v1/generate").to_request();
		let response = test::call_service(&app, request).await;
		assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

		let request = test::TestRequest::get().uri("/v1/generate?dead_end=salvage").to_request();
		let response = test::call_service(&app, request).await;
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(text(response).await, "hello world");
	}

	#[actix_web::test]
	async fn missing_corpus_keeps_previous_chain() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("fox.txt"), "The quick brown fox.\n").unwrap();
		let app = test::init_service(App::new().app_data(shared(dir.path())).configure(configure)).await;

		let request = test::TestRequest::put().uri("/v1/load_corpora?names=fox").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

		let request = test::TestRequest::put().uri("/v1/load_corpora?names=fox,absent").to_request();
		assert_eq!(test::call_service(&app, request).await.status(), StatusCode::NOT_FOUND);

		let request = test::TestRequest::get().uri("/v1/chain").to_request();
		let dump = text(test::call_service(&app, request).await).await;
		assert!(dump.starts_with("__$ => [The]\n"));
	}

	#[actix_web::test]
	async fn bad_queries() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(shared(dir.path())).configure(configure)).await;

		for uri in ["/v1/generate?count=0", "/v1/generate?count=1000", "/v1/generate?dead_end=maybe"] {
			let request = test::TestRequest::get().uri(uri).to_request();
			let response = test::call_service(&app, request).await;
			assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
		}

		for uri in ["/v1/load_corpora", "/v1/load_corpora?names=../etc"] {
			let request = test::TestRequest::put().uri(uri).to_request();
			let response = test::call_service(&app, request).await;
			assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}
}
