//! Basic usage of cuckoo-targeting

use cuckoo_targeting::serialize::{deserialize, serialize};
use cuckoo_targeting::utils::efficient_size;
use cuckoo_targeting::{build_filter, check_filter, AdTargeting, CuckooFilter, HashFunctionId};
use std::collections::HashSet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Cuckoo Targeting Examples ===\n");

    // Example 1: A filter sized for a target false-positive rate
    println!("1. Sized cuckoo filter:");
    let keywords = ["shoes", "boots", "sandals", "sneakers", "slippers"];
    let config = efficient_size(0.01, keywords.len())?;
    let mut filter = CuckooFilter::new(config)?;
    for keyword in keywords {
        filter.insert(keyword)?;
    }
    for keyword in keywords.iter().chain(&["hats", "gloves"]) {
        println!("  {} in filter: {}", keyword, filter.contains(keyword));
    }
    println!("  {}", filter.stats());
    println!();

    // Example 2: Byte round trip, with the FNV hash instead of Murmur3
    println!("2. Serialization:");
    let config = efficient_size(0.001, 100)?.with_hash_function(HashFunctionId::Fnv1a64);
    let mut apps = CuckooFilter::new(config)?;
    for i in 0..100 {
        apps.insert(&format!("com.example.app{}", i))?;
    }
    let serialized = serialize(&apps);
    let restored = deserialize(&serialized)?;
    println!("  {} bytes, {} items restored", serialized.len(), restored.len());
    println!("  com.example.app7 restored: {}", restored.contains("com.example.app7"));
    println!();

    // Example 3: Build and verify as the command-line tools do
    println!("3. Build and verify:");
    let encoded = build_filter(&keywords, 0.01, keywords.len())?;
    let report = check_filter(&keywords, &encoded, 0.01, &mut rand::thread_rng())?;
    println!("  Base64 filter: {}", encoded);
    println!("  {}", report);
    println!();

    // Example 4: Matching an ad whose lists were replaced by filters
    println!("4. Ad matching:");
    let data = format!(
        "{{\"keywordFilter\":\"{}\",\"excludeFilter\":\"{}\"}}",
        encoded,
        build_filter(&["kids"], 0.01, 1)?
    );
    let ad = AdTargeting::from_data(&data)?;
    let installed: HashSet<String> = HashSet::new();
    for request in ["  Boots ", "kids", "hats"] {
        let keyword = cuckoo_targeting::targeting::normalize_keyword(request);
        println!("  {:?} matches: {}", request, ad.is_match(&keyword, &installed));
    }

    Ok(())
}
