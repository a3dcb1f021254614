use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meowlang::{lexer, parser};

/// A representative script: nested blocks, loops, functions, containers.
fn workload() -> String {
    let mut source = String::from("miaou\n");
    for i in 0..50 {
        source.push_str(&format!(
            concat!(
                "fonction calcul{i}(n):\n",
                "    total = 0\n",
                "    pour chaque x dans liste(1, 2, 3, n):\n",
                "        si x % 2 = 0 alors:\n",
                "            total = total + x * {i}\n",
                "        sinon:\n",
                "            total = total + 1\n",
                "    retour total\n",
                "valeurs{i} = {{\"n\": {i}, \"carre\": {i} ** 2}}\n",
                "ecrire calcul{i}(valeurs{i}[\"n\"]), valeurs{i}[\"carre\"]\n",
            ),
            i = i
        ));
    }
    source.push_str("meow\n");
    source
}

fn bench_frontend(c: &mut Criterion) {
    let source = workload();
    let tokens = lexer::tokenize(&source).expect("tokenize");

    c.bench_function("frontend_tokenize", |b| {
        b.iter(|| {
            let out = lexer::tokenize(black_box(&source)).expect("tokenize");
            black_box(out);
        })
    });

    c.bench_function("frontend_parse_only", |b| {
        b.iter(|| {
            let out = parser::parse_tokens(black_box(tokens.clone())).expect("parse");
            black_box(out);
        })
    });

    c.bench_function("frontend_tokenize_parse", |b| {
        b.iter(|| {
            let tokens = lexer::tokenize(black_box(&source)).expect("tokenize");
            let out = parser::parse_tokens(tokens).expect("parse");
            black_box(out);
        })
    });
}

criterion_group!(benches, bench_frontend);
criterion_main!(benches);
