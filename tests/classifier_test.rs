mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use complaint_router::model_store::sha256_hex;
use complaint_router::{ClassifierConfig, ClassifierError, DepartmentClassifier, LazyClassifier};

fn load_fixture() -> (tempfile::TempDir, DepartmentClassifier) {
    common::init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_department_artifact(dir.path());
    let classifier = DepartmentClassifier::load(&ClassifierConfig::new(path)).unwrap();
    (dir, classifier)
}

#[test]
fn test_one_label_per_text_in_input_order() -> Result<(), ClassifierError> {
    let (_dir, classifier) = load_fixture();
    let texts = [
        "Luminaria apagada en la plaza",
        "El semáforo de la esquina no funciona",
        "Hace dos semanas que no pasa el camión de la basura",
        "No hay luz en toda la cuadra",
        "Problemas de tránsito en la avenida",
    ];

    let labels = classifier.classify(&texts)?;
    assert_eq!(labels.len(), texts.len());
    let names: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
    assert_eq!(names, vec!["Alumbrado", "Transito", "Limpieza", "Alumbrado", "Transito"]);
    Ok(())
}

#[test]
fn test_classification_is_deterministic() -> Result<(), ClassifierError> {
    let (_dir, classifier) = load_fixture();
    let first = classifier.classify(&["text A"])?;
    let second = classifier.classify(&["text A"])?;
    assert_eq!(first, second);

    let batch = classifier.classify(&["text A", "La basura se acumula", "text A"])?;
    assert_eq!(batch[0], first[0]);
    assert_eq!(batch[2], first[0]);
    Ok(())
}

#[test]
fn test_unknown_words_still_get_a_department_from_the_vocabulary() -> Result<(), ClassifierError> {
    let (_dir, classifier) = load_fixture();
    let label = classifier.classify_one("Ruidos molestos durante la noche")?;
    assert!(classifier.vocabulary().contains(&label));
    Ok(())
}

#[test]
fn test_empty_and_missing_texts_are_invalid_input() {
    let (_dir, classifier) = load_fixture();

    let err = classifier.classify(&[""]).unwrap_err();
    assert!(matches!(err, ClassifierError::InvalidInput { index: 0, .. }));

    let err = classifier
        .classify_entries(&[Some("La basura se acumula"), None])
        .unwrap_err();
    assert!(matches!(err, ClassifierError::InvalidInput { index: 1, .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_missing_artifact_is_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClassifierConfig::new(dir.path().join("nope.json"));
    let err = DepartmentClassifier::load(&config).unwrap_err();
    assert!(matches!(err, ClassifierError::ModelUnavailable(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_corrupted_and_incompatible_artifacts_are_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();

    let truncated = dir.path().join("truncated.json");
    let bytes = serde_json::to_vec(&common::department_artifact()).unwrap();
    fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(
        DepartmentClassifier::load(&ClassifierConfig::new(&truncated)),
        Err(ClassifierError::ModelUnavailable(_))
    ));

    let mut artifact = common::department_artifact();
    artifact["coef"][1] = serde_json::json!([1.0, 2.0]);
    let path = common::write_json(&dir.path().join("bad_shape.json"), &artifact);
    assert!(matches!(
        DepartmentClassifier::load(&ClassifierConfig::new(&path)),
        Err(ClassifierError::ModelUnavailable(_))
    ));

    let mut artifact = common::department_artifact();
    artifact["format_version"] = serde_json::json!(2);
    let path = common::write_json(&dir.path().join("future.json"), &artifact);
    assert!(matches!(
        DepartmentClassifier::load(&ClassifierConfig::new(&path)),
        Err(ClassifierError::ModelUnavailable(_))
    ));
}

#[test]
fn test_expected_hash_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_department_artifact(dir.path());
    let digest = sha256_hex(&fs::read(&path).unwrap());

    let ok = ClassifierConfig::new(&path).with_expected_sha256(digest.to_uppercase());
    assert!(DepartmentClassifier::load(&ok).is_ok());

    let wrong = ClassifierConfig::new(&path).with_expected_sha256("00".repeat(32));
    let err = DepartmentClassifier::load(&wrong).unwrap_err();
    assert!(err.to_string().contains("hash mismatch"));
}

#[test]
fn test_lazy_classifier_retries_until_artifact_appears() -> Result<(), ClassifierError> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("department_classifier.json");
    let lazy = LazyClassifier::new(ClassifierConfig::new(&path));

    for _ in 0..2 {
        let err = lazy.classify(&["El semáforo de la esquina no funciona"]).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelUnavailable(_)));
        assert!(!lazy.is_loaded());
    }

    common::write_department_artifact(dir.path());
    let labels = lazy.classify(&["El semáforo de la esquina no funciona"])?;
    assert_eq!(labels[0], "Transito");
    assert!(lazy.is_loaded());

    // Once loaded the model is kept even if the file goes away
    fs::remove_file(&path).unwrap();
    let first = lazy.get()?;
    let second = lazy.get()?;
    assert!(Arc::ptr_eq(&first, &second));
    drop((first, second));

    lazy.shutdown();
    assert!(!lazy.is_loaded());
    Ok(())
}

#[test]
fn test_lazy_classifier_is_not_reloaded_after_shutdown() -> Result<(), ClassifierError> {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_department_artifact(dir.path());
    let lazy = LazyClassifier::new(ClassifierConfig::new(&path));
    assert_eq!(lazy.classify(&["Semáforo roto"])?[0], "Transito");

    lazy.shutdown();

    // A retrained artifact on disk must not be picked up by this process
    let mut retrained = common::department_artifact();
    retrained["model_version"] = "retrained".into();
    common::write_json(&path, &retrained);

    for _ in 0..2 {
        let err = lazy.classify(&["Semáforo roto"]).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelUnavailable(ref m) if m.contains("shut down")));
        assert!(!lazy.is_loaded());
    }
    assert!(lazy.get().is_err());
    lazy.shutdown();
    Ok(())
}

#[test]
fn test_concurrent_callers_get_independent_results() {
    let (_dir, classifier) = load_fixture();
    let classifier = Arc::new(classifier);
    let cases = [
        ("El semáforo de la esquina no funciona", "Transito"),
        ("La basura se acumula en la vereda", "Limpieza"),
        ("La luminaria del parque no prende", "Alumbrado"),
    ];

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let classifier = Arc::clone(&classifier);
            let (text, expected) = cases[i % cases.len()];
            thread::spawn(move || {
                for _ in 0..50 {
                    let labels = classifier.classify(&[text, text]).unwrap();
                    assert_eq!(labels.len(), 2);
                    assert_eq!(labels[0], expected);
                    assert_eq!(labels[1], expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_info_reports_vocabulary() {
    let (_dir, classifier) = load_fixture();
    let info = classifier.info();
    assert_eq!(info.model_kind, "linear");
    assert_eq!(info.model_version.as_deref(), Some("2024.06-test"));
    assert_eq!(info.department_labels, common::DEPARTMENTS.to_vec());
    assert!(info.artifact_path.unwrap().ends_with("department_classifier.json"));
    classifier.shutdown();
}
