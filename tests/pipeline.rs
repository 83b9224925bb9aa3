//! End-to-end library scenarios: ingest a small corpus with the offline
//! hash embedder, then retrieve and answer against the built index.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use persona_codex::annotate::{category_prefix, prefix_category};
use persona_codex::assistant::{Assistant, Session};
use persona_codex::config::{parse_config, Config};
use persona_codex::embedding::HashProvider;
use persona_codex::error::RagError;
use persona_codex::generate::StaticGenerator;
use persona_codex::index::VectorIndex;
use persona_codex::ingest::ingest;
use persona_codex::models::DocumentType;
use persona_codex::prompt::{Mode, PromptComposer};
use persona_codex::retriever::{Retriever, CONTEXT_SEPARATOR};

const DIMS: usize = 256;

/// Build a PDF with one page per entry in `pages`, each page holding the
/// given lines of text.
fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 750.into()]),
        ];
        for line in lines.iter() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn test_config(root: &Path) -> Config {
    parse_config(&format!(
        r#"
[corpus]
dir = "{corpus}"

[index]
dir = "{index}"

[embedding]
provider = "hash"
dims = {dims}

[generation]
provider = "static"
static_text = "I work mostly in Python and Java."
"#,
        corpus = root.join("corpus").display(),
        index = root.join("db").display(),
        dims = DIMS,
    ))
    .unwrap()
}

fn corpus_dir(root: &Path) -> PathBuf {
    let dir = root.join("corpus");
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn values_300_chars() -> String {
    let sentence = "I value curiosity, resilience and continuous learning in everything I build. ";
    let mut text = sentence.repeat(4);
    text.truncate(300);
    text
}

async fn retriever(config: &Config) -> Retriever {
    Retriever::open(&config.index.dir, Box::new(HashProvider::new(DIMS))).await
}

#[tokio::test]
async fn cv_pdf_and_values_markdown_are_indexed_by_type() {
    let tmp = TempDir::new().unwrap();
    let corpus = corpus_dir(tmp.path());
    fs::write(
        corpus.join("cv.pdf"),
        pdf_with_pages(&[
            &[
                "Yanga Rubushe - Curriculum Vitae",
                "BSc Computer Science and Statistics, University of the Western Cape",
            ],
            &[
                "Technical skills: Python, Java, R, SAS, TypeScript, Node.js",
                "Backend development with RESTful APIs, SQL and Docker",
            ],
        ]),
    )
    .unwrap();
    fs::write(corpus.join("values.md"), values_300_chars()).unwrap();

    let config = test_config(tmp.path());
    let summary = ingest(&config, &HashProvider::new(DIMS)).await.unwrap();

    assert!(summary.load_failures.is_empty(), "{:?}", summary.load_failures);
    assert!(summary.chunks_by_type[&DocumentType::Cv] >= 1);
    assert!(summary.chunks_by_type[&DocumentType::Values] >= 1);
    assert_eq!(summary.chunks_by_type[&DocumentType::Project], 0);
    assert_eq!(
        summary.total_chunks,
        summary.chunks_by_type.values().sum::<usize>()
    );

    let index = VectorIndex::open(&config.index.dir).await.unwrap();
    let all = index.query(&unit_vector(), summary.total_chunks).await.unwrap();
    assert_eq!(all.len(), summary.total_chunks);
    for hit in &all {
        let meta = &hit.chunk.metadata;
        assert_eq!(prefix_category(&hit.chunk.text), Some(meta.document_type));
        if meta.document_type == DocumentType::Cv {
            assert!(hit.chunk.text.starts_with("[CV/RESUME CONTENT] "));
            assert_eq!(meta.source_file, "cv.pdf");
            assert!(matches!(meta.page_number, Some(1) | Some(2)));
        }
    }
    index.close().await;
}

fn unit_vector() -> Vec<f32> {
    let mut v = vec![0.0; DIMS];
    v[0] = 1.0;
    v
}

#[tokio::test]
async fn empty_corpus_leaves_index_untouched() {
    let tmp = TempDir::new().unwrap();
    corpus_dir(tmp.path());
    let config = test_config(tmp.path());

    let err = ingest(&config, &HashProvider::new(DIMS)).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyCorpus(_)));
    assert!(!config.index.dir.exists());
}

#[tokio::test]
async fn empty_corpus_keeps_previous_index() {
    let tmp = TempDir::new().unwrap();
    let corpus = corpus_dir(tmp.path());
    fs::write(corpus.join("values.md"), values_300_chars()).unwrap();
    let config = test_config(tmp.path());
    let first = ingest(&config, &HashProvider::new(DIMS)).await.unwrap();

    fs::remove_file(corpus.join("values.md")).unwrap();
    let err = ingest(&config, &HashProvider::new(DIMS)).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyCorpus(_)));

    let index = VectorIndex::open(&config.index.dir).await.unwrap();
    assert_eq!(index.len().await.unwrap(), first.total_chunks);
    index.close().await;
}

async fn skills_corpus(root: &Path) -> Config {
    let corpus = corpus_dir(root);
    fs::write(
        corpus.join("cv.txt"),
        "Technical skills: Python, Java, SQL and Docker. I build backend services and RESTful APIs.",
    )
    .unwrap();
    fs::write(
        corpus.join("project_cinenex.md"),
        "CineNex is a Netflix clone I built to learn streaming layouts, authentication and TypeScript.",
    )
    .unwrap();
    fs::write(
        corpus.join("hobbies.txt"),
        "Outside of work I enjoy hiking, reading science fiction and cooking for friends on weekends.",
    )
    .unwrap();
    fs::write(corpus.join("values.md"), values_300_chars()).unwrap();

    let config = test_config(root);
    ingest(&config, &HashProvider::new(DIMS)).await.unwrap();
    config
}

#[tokio::test]
async fn skills_question_retrieves_cv_chunk() {
    let tmp = TempDir::new().unwrap();
    let config = skills_corpus(tmp.path()).await;
    let retriever = retriever(&config).await;

    let context = retriever
        .retrieve("What are your technical skills?", 3)
        .await;
    assert!(context.contains("Python, Java"), "{}", context);
    assert!(context.contains(category_prefix(DocumentType::Cv)));
    assert!(context.split(CONTEXT_SEPARATOR).count() <= 3);
    retriever.close().await;
}

#[tokio::test]
async fn larger_k_extends_smaller_k() {
    let tmp = TempDir::new().unwrap();
    let config = skills_corpus(tmp.path()).await;
    let retriever = retriever(&config).await;

    let query = "projects built with TypeScript";
    let mut previous: Vec<String> = Vec::new();
    for k in 1..=5 {
        let hits: Vec<String> = retriever
            .search(query, k)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.text)
            .collect();
        assert!(hits.len() <= k);
        assert_eq!(&hits[..previous.len()], &previous[..]);
        previous = hits;
    }
    retriever.close().await;
}

#[tokio::test]
async fn reingesting_unchanged_corpus_is_stable() {
    let tmp = TempDir::new().unwrap();
    let config = skills_corpus(tmp.path()).await;

    let first = ingest(&config, &HashProvider::new(DIMS)).await.unwrap();
    let second = ingest(&config, &HashProvider::new(DIMS)).await.unwrap();
    assert_eq!(first.chunks_by_type, second.chunks_by_type);
    assert_eq!(first.total_chunks, second.total_chunks);

    let index = VectorIndex::open(&config.index.dir).await.unwrap();
    assert_eq!(index.len().await.unwrap(), second.total_chunks);
    index.close().await;
}

#[tokio::test]
async fn interview_answer_uses_stub_generator() {
    let tmp = TempDir::new().unwrap();
    let config = skills_corpus(tmp.path()).await;
    let assistant = Assistant::with_parts(
        &config,
        Box::new(HashProvider::new(DIMS)),
        Box::new(StaticGenerator::new("I work mostly in Python and Java.")),
    )
    .await;

    let mut session = Session::new(assistant.persona_name(), Mode::Interview);
    let answer = session
        .ask(&assistant, "What are your technical skills?")
        .await
        .unwrap();
    assert!(!answer.is_empty());
    assert_eq!(session.memory.len(), 2);
    assistant.close().await;
}

#[test]
fn unknown_mode_is_rejected_before_composition() {
    let composer = PromptComposer::new(test_config(Path::new("/tmp")).persona);
    for bad in ["poetry", "INTERVIEW", "humble brag"] {
        assert!(matches!(
            composer.compose_named(bad, "ctx", "history", "q"),
            Err(RagError::InvalidMode(_))
        ));
        assert!(matches!(bad.parse::<Mode>(), Err(RagError::InvalidMode(_))));
    }
}
