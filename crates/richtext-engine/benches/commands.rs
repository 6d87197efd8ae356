use criterion::{Criterion, criterion_group, criterion_main};
use richtext_engine::commands::{InsertText, ToggleMark, select_all};
use richtext_engine::keymap::Platform;
use richtext_engine::{
    Command, Editor, EditorOptions, EditorState, Selection, Transaction, basic_schema,
};
mod common;

fn run(command: &dyn Command, state: &EditorState) -> Option<EditorState> {
    let mut next = None;
    command.execute(
        state,
        Some(&mut |tr: Transaction| next = state.apply(&tr).ok()),
    );
    next
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    group.sample_size(10);

    let doc = common::generate_document(100);
    let state =
        EditorState::create_with_selection(basic_schema(), doc, Selection::cursor(3)).unwrap();
    let insert = InsertText::new("x");
    group.bench_function("insert_char", |b| {
        b.iter(|| std::hint::black_box(run(&insert, &state)));
    });

    group.bench_function("editor_type_100_chars", |b| {
        b.iter(|| {
            let mut editor = Editor::new(EditorOptions {
                platform: Platform::Other,
                ..EditorOptions::default()
            })
            .unwrap();
            for _ in 0..100 {
                editor.type_text("a").unwrap();
            }
            std::hint::black_box(editor.state().doc().content_size());
        });
    });

    group.finish();
}

fn bench_marks(c: &mut Criterion) {
    let mut group = c.benchmark_group("marks");
    group.sample_size(10);

    let state = EditorState::create(basic_schema(), Some(common::generate_paragraph(10_000)));
    let all = run(&select_all, &state).unwrap();
    let toggle = ToggleMark::new("strong");
    group.bench_function("toggle_strong_whole_paragraph", |b| {
        b.iter(|| std::hint::black_box(run(&toggle, &all)));
    });

    group.finish();
}

criterion_group!(benches, bench_typing, bench_marks);
criterion_main!(benches);
