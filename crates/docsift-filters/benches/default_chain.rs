use docsift_core::Document;
use docsift_filters::{StagesConfig, build_chain};

const PROSE: &str = "きょうはあさからとてもよいてんきだったので、わたしはいぬといっしょにちかくのこうえんまでさんぽにでかけました。";

fn records(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let text = match i % 3 {
                0 => PROSE.repeat(4),
                1 => "short".to_string(),
                _ => format!("{}\n2024年1月2日\nお問い合わせ: 03-1234-5678", PROSE.repeat(2)),
            };
            serde_json::json!({ "text": text }).to_string()
        })
        .collect()
}

#[divan::bench(args = [100, 1000])]
fn default_chain(bencher: divan::Bencher, n: usize) {
    let chain = build_chain(&StagesConfig::default()).unwrap();
    let lines = records(n);
    bencher.bench(|| {
        let mut stats = chain.new_stats();
        for line in &lines {
            let mut doc = Document::new(line.as_str());
            chain.apply(&mut doc, &mut stats).unwrap();
            divan::black_box(doc.dumped());
        }
    });
}

fn main() {
    divan::main();
}
