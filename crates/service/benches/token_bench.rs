use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::auth::token::TokenCodec;
use service::auth::validator::SessionValidator;
use service::mock::MemoryStore;

fn bench_tokens(c: &mut Criterion) {
    let codec = Arc::new(TokenCodec::new("bench-secret", 86_400));
    let store = Arc::new(MemoryStore::default());
    let user = store.seed_user("bench", "bench@example.com");
    let token = codec.issue(&user, None).unwrap();

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(&user, None).unwrap());
    });

    c.bench_function("token_verify", |b| {
        b.iter(|| codec.verify(&token).unwrap());
    });

    // header parse + verify + user lookup
    let rt = tokio::runtime::Runtime::new().unwrap();
    let validator = SessionValidator::new(codec.clone(), store.clone(), store.clone());
    let header = format!("Bearer {token}");
    c.bench_function("session_validate", |b| {
        b.iter(|| rt.block_on(validator.validate(Some(&header))).unwrap());
    });
}

criterion_group!(benches, bench_tokens);
criterion_main!(benches);
