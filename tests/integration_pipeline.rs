//! Integration tests for the work order ETL public API
//!
//! These tests drive each stage through the library surface the binary
//! uses, with source exports shaped like the real field-service dumps.

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use workorder_etl::detector::FormatDetector;
use workorder_etl::enrichment::{EquipmentMasterEnricher, TechnicalLocationEnricher};
use workorder_etl::extractor::Extractor;
use workorder_etl::loader::{Loader, verify_table_columns};
use workorder_etl::table::{column_names, text_values};
use workorder_etl::transformer::Transformer;
use workorder_etl::{Enricher, EtlConfig, EtlError, Pipeline, PipelineInputs};

fn config() -> EtlConfig {
    EtlConfig::default().without_progress()
}

fn write(dir: &Path, name: &str, contents: &[u8]) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Three exports from different regional systems
fn write_exports(dir: &Path) {
    write(
        dir,
        "01_bogota.csv",
        "Activity_Work_Type,Orden_de_Trabajo,Tipo_de_Inventario,Fecha_de_Ruta,Ciudad,Nodo,\n\
         INSTALACION,OT-1,A1,2024-03-01,Bogotá,N1,\n\
         REPARACION,OT-2,B2,2024-03-01,Bogotá,N2,\n"
            .as_bytes(),
    );
    write(
        dir,
        "02_cali.csv",
        b"WORK_TYPE;WORK_ORDER;TIPO_INV;ROUTE_DATE;CITY;NODE;C\xD3DIGO_EQUIPO\n\
          INSTALACION;OT-3;A1;2024-03-02;Cali;N3;K-9\n\
          ;;;;;;\n",
    );
    write(
        dir,
        "03_pasto.csv",
        "tipo_actividad\tot\tnodo\tid_aliado\nRETIRO\tOT-4\tN1\tALIADO-7\n".as_bytes(),
    );
}

#[test]
fn test_detector_identifies_each_export() {
    let temp_dir = TempDir::new().unwrap();
    write_exports(temp_dir.path());

    let detector = FormatDetector::from_config(&config()).unwrap();

    let bogota = detector.detect(&temp_dir.path().join("01_bogota.csv")).unwrap();
    assert_eq!(bogota.encoding_label, "utf-8");
    assert_eq!(bogota.delimiter, b',');

    let cali = detector.detect(&temp_dir.path().join("02_cali.csv")).unwrap();
    assert_eq!(cali.encoding_label, "latin1");
    assert_eq!(cali.delimiter, b';');

    let pasto = detector.detect(&temp_dir.path().join("03_pasto.csv")).unwrap();
    assert_eq!(pasto.delimiter, b'\t');
    assert_eq!(pasto.delimiter_display(), "\\t");
}

#[test]
fn test_stages_compose_through_public_api() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    fs::create_dir_all(&source).unwrap();
    write_exports(&source);

    let config = config();
    let extraction = Extractor::new(&config).unwrap().extract(&source).unwrap();
    assert_eq!(extraction.files.len(), 3);
    assert_eq!(extraction.total_rows(), 5);

    let transformed = Transformer::new().transform(&extraction.tables).unwrap();
    let table = &transformed.table;

    // WORK_TYPE never merges into the ACTIVITY_WORK_TYPE column from file 1
    assert_eq!(
        column_names(table),
        vec![
            "ACTIVITY_WORK_TYPE",
            "TIPO_DE_INVENTARIO",
            "ORDEN_DE_TRABAJO",
            "ID_ALIADO",
            "FECHA_DE_RUTA",
            "CIUDAD",
            "NODO",
            "LLAVE",
        ]
    );
    assert_eq!(table.height(), 4);
    assert_eq!(transformed.report.rows_removed, 1);
    assert_eq!(
        text_values(table, "ORDEN_DE_TRABAJO").unwrap(),
        vec![
            Some("OT-1".to_string()),
            Some("OT-2".to_string()),
            None,
            None
        ]
    );
    assert_eq!(
        text_values(table, "LLAVE").unwrap(),
        vec![None, None, Some("K-9".to_string()), None]
    );

    let master = temp_dir.path().join("maestro.csv");
    fs::write(
        &master,
        b"FABRICANTE;FAMILIA;REFERENCIA;TECNOLOGIA;LLAVE\nACME;Router;R-1;GPON;A1@\n",
    )
    .unwrap();
    let locations = temp_dir.path().join("ubicaciones.csv");
    fs::write(
        &locations,
        b"ID;ESTADO;TIPOLOGIA_RED;OPERA;ALIADO_ZONIFICADO\nN1;Activo;FTTH;SI;NORTE\n",
    )
    .unwrap();

    let enrichers: Vec<Box<dyn Enricher>> = vec![
        Box::new(EquipmentMasterEnricher::new(&master, &config)),
        Box::new(TechnicalLocationEnricher::new(&locations, &config)),
    ];
    let mut enriched = transformed.table.clone();
    for enricher in &enrichers {
        let outcome = enricher.enrich(&enriched);
        assert!(!outcome.is_degraded(), "{} degraded", enricher.name());
        enriched = outcome.into_table();
    }

    assert_eq!(enriched.height(), 4);
    assert_eq!(
        text_values(&enriched, "MASTER_FABRICANTE").unwrap(),
        vec![Some("ACME".to_string()), None, None, None]
    );
    assert_eq!(
        text_values(&enriched, "LOCATION_ALIADO_ZONA").unwrap(),
        vec![Some("NORTE".to_string()), None, None, Some("NORTE".to_string())]
    );

    let output = temp_dir.path().join("output");
    let report = Loader::new(&output, &config)
        .load_with_run_id(&enriched, "20240302080000")
        .unwrap();
    assert!(
        verify_table_columns(
            &report.sqlite.path,
            "datos_consolidados",
            &column_names(&enriched)
        )
        .unwrap()
    );

    let conn = Connection::open(&report.sqlite.path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM datos_consolidados", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 4);
}

#[test]
fn test_pipeline_run_reports_every_stage() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("source");
    fs::create_dir_all(&source).unwrap();
    write_exports(&source);

    let inputs = PipelineInputs {
        source_dir: source,
        output_dir: temp_dir.path().join("output"),
        equipment_master: None,
        technical_locations: None,
    };
    let summary = Pipeline::new(config()).run(&inputs).unwrap();

    assert_eq!(summary.files.len(), 3);
    assert_eq!(summary.transform.original_rows, 5);
    assert_eq!(summary.transform.final_rows, 4);
    assert!(summary.transform.missing_columns.contains(&"NUMERO_DE_CUENTA".to_string()));
    assert!(summary.load.csv.path.exists());
    assert!(summary.load.sqlite.path.exists());
    assert!(summary.columns_verified);
}

#[test]
fn test_pipeline_hard_stop_on_missing_source() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = PipelineInputs {
        source_dir: temp_dir.path().join("no_such_dir"),
        output_dir: temp_dir.path().join("output"),
        ..Default::default()
    };

    let error = Pipeline::new(config()).run(&inputs).unwrap_err();
    assert!(matches!(error, EtlError::PathNotFound { .. }));
}
