use phishshield_core::config::PolicyConfig;
use phishshield_core::services::{
    extract_detailed, schema::SchemaReport, ClassificationEngine, ModelStore, TrustedDomainSet,
    FEATURE_LAYOUT,
};

const PROBE_URLS: &[&str] = &[
    "https://www.google.com",
    "https://github.com/rust-lang/rust",
    "http://192.168.1.1/admin/login.php",
    "https://bit.ly/verify-login",
    "http://secure-paypal-account.verify-update.com/signin?user=1&token=abc",
    "http://[::1/broken",
    "",
];

fn main() {
    dotenv::dotenv().ok();

    let model_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MODEL_DIR").ok())
        .unwrap_or_else(|| "model".to_string());

    println!("🔎 PHISHSHIELD MODEL CHECK");
    println!("   Model directory: {}", model_dir);

    // Step 1: load artifacts
    println!("\n📋 Loading model artifacts...");
    let loaded = match ModelStore::new(&model_dir).load() {
        Ok(loaded) => {
            println!("✅ 1. Artifacts loaded");
            println!("   Model type: {}", loaded.metadata.model_type);
            println!("   Feature count: {}", loaded.metadata.feature_count);
            for (file, checksum) in &loaded.metadata.checksums {
                println!("   {}: sha256 {}", file, checksum);
            }
            loaded
        },
        Err(e) => {
            println!("❌ 1. Failed to load artifacts: {}", e);
            std::process::exit(1);
        },
    };

    // Step 2: schema comparison
    println!("\n📋 Comparing model schema with extractor layout...");
    println!("   Model features:     {:?}", loaded.adapter.schema().names());
    println!("   Extractor features: {:?}", FEATURE_LAYOUT);
    let report = SchemaReport::compare(loaded.adapter.schema(), FEATURE_LAYOUT);
    println!("   Missing in extractor: {:?}", report.missing_in_extractor);
    println!("   Extra in extractor:   {:?}", report.extra_in_extractor);
    println!("   Order matches: {}", report.order_matches);
    match &loaded.schema_check {
        Ok(_) if report.order_matches => println!("✅ 2. Schema matches"),
        Ok(_) => println!("⚠️  2. Same feature count, names or order differ"),
        Err(e) => {
            println!("❌ 2. {}", e);
            std::process::exit(1);
        },
    }

    // Step 3: extraction and scoring over the probe set
    println!("\n📋 Scoring probe URLs...");
    let trusted = TrustedDomainSet::load_or_builtin(
        std::env::var("TRUSTED_DOMAINS_PATH")
            .unwrap_or_else(|_| "data/trusted_domains.json".to_string()),
    );
    let engine = ClassificationEngine::new(Some(loaded), trusted, PolicyConfig::default());

    let mut failures = 0;
    for url in PROBE_URLS {
        let extraction = extract_detailed(url);
        let marker = if extraction.is_fallback() { " (fallback)" } else { "" };
        println!("\n   URL: {:?}{}", url, marker);
        for (name, value) in extraction.vector().iter() {
            println!("     {:<22} {}", name, value.as_f64());
        }

        match engine.classify_one(url) {
            Ok(result) => println!(
                "   → {} (confidence {:.3}){}",
                if result.is_phishing { "PHISHING" } else { "legitimate" },
                result.confidence,
                result
                    .reason
                    .map(|r| format!(" [{}]", r))
                    .unwrap_or_default()
            ),
            Err(e) => {
                failures += 1;
                println!("   ❌ {}", e);
            },
        }
    }

    if failures > 0 {
        println!("\n❌ {} probe URL(s) failed to score", failures);
        std::process::exit(1);
    }

    println!("\n✅ 3. All probe URLs scored");
}
