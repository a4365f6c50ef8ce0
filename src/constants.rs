//! Canonical schema, enrichment column names and pipeline defaults.

// =============================================================================
// Canonical Schema
// =============================================================================

/// Canonical output columns, in output order, each with its accepted source
/// names in priority order. Synonyms are compared after the same
/// normalization applied to source headers (accents stripped, uppercased,
/// trimmed).
pub const CANONICAL_SCHEMA: &[(&str, &[&str])] = &[
    (
        "ACTIVITY_WORK_TYPE",
        &["ACTIVITY_WORK_TYPE", "TIPO_ACTIVIDAD", "WORK_TYPE"],
    ),
    (
        "WORK_ORDER_SUBTYPE",
        &["WORK_ORDER_SUBTYPE", "SUBTIPO_OT", "ORDER_SUBTYPE"],
    ),
    (
        "TIPO_DE_INVENTARIO",
        &["TIPO_DE_INVENTARIO", "INVENTARIO_TIPO", "TIPO_INV"],
    ),
    (
        "GRUPO_DE_INVENTARIOS",
        &["GRUPO_DE_INVENTARIOS", "GRUPO_INV", "INVENTORY_GROUP"],
    ),
    ("ORDEN_DE_TRABAJO", &["ORDEN_DE_TRABAJO", "WORK_ORDER", "OT"]),
    ("ID_ALIADO", &["ID_ALIADO", "ALIADO_ID", "PARTNER_ID"]),
    (
        "ID_EXTERNO_DE_RECURSO",
        &["ID_EXTERNO_DE_RECURSO", "EXTERNAL_RESOURCE_ID", "RECURSO_ID"],
    ),
    (
        "NUMERO_DE_CUENTA",
        &[
            "NÚMERO_DE_CUENTA",
            "NUMERO_DE_CUENTA",
            "ACCOUNT_NUMBER",
            "NÃšMERO_DE_CUENTA",
        ],
    ),
    ("FECHA_DE_RUTA", &["FECHA_DE_RUTA", "ROUTE_DATE", "FECHA_RUTA"]),
    ("CIUDAD", &["CIUDAD", "NOMBRE_CIUDAD", "CITY"]),
    ("NODO", &["NODO", "NODE", "UBICACION_TECNICA"]),
    ("LLAVE", &["LLAVE", "KEY", "CODIGO_EQUIPO"]),
];

/// Canonical inventory-type column, the equipment master join key
pub const INVENTORY_TYPE_COLUMN: &str = "TIPO_DE_INVENTARIO";

/// Canonical node column, the technical location join key
pub const NODE_COLUMN: &str = "NODO";

/// Prefix of artifact columns produced by blank headers
pub const UNNAMED_PREFIX: &str = "UNNAMED";

// =============================================================================
// Equipment Master
// =============================================================================

pub mod equipment {
    /// Source header (trimmed, lowercased) to internal name
    pub const COLUMN_RENAMES: &[(&str, &str)] = &[
        ("fabricante", "FABRICANTE"),
        ("familia", "FAMILIA"),
        ("referencia", "REFERENCIA"),
        ("tecnologia", "TECNOLOGIA"),
        ("llave", "LLAVE"),
    ];

    pub const KEY_COLUMN: &str = "LLAVE";

    /// Marker stripped from reference keys before matching
    pub const KEY_MARKER: char = '@';

    pub const DESCRIPTIVE_COLUMNS: &[&str] = &["FABRICANTE", "FAMILIA", "REFERENCIA", "TECNOLOGIA"];

    pub const OUTPUT_COLUMNS: &[&str] = &[
        "MASTER_FABRICANTE",
        "MASTER_FAMILIA",
        "MASTER_REFERENCIA",
        "MASTER_TECNOLOGIA",
    ];
}

// =============================================================================
// Technical Locations
// =============================================================================

pub mod location {
    pub const ID_COLUMN: &str = "ID";

    pub const DESCRIPTIVE_COLUMNS: &[&str] = &["ESTADO", "TIPOLOGIA_RED", "OPERA", "ALIADO_ZONIFICADO"];

    pub const OUTPUT_COLUMNS: &[&str] = &[
        "LOCATION_ESTADO",
        "LOCATION_TIPOLOGIA",
        "LOCATION_OPERA",
        "LOCATION_ALIADO_ZONA",
    ];
}

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_CANDIDATE_ENCODINGS: &[&str] = &["utf-8", "latin1", "iso-8859-1"];

pub const DEFAULT_CANDIDATE_DELIMITERS: &[char] = &[',', ';', '\t', '|'];

pub const DEFAULT_SAMPLE_LINES: usize = 5;

pub const DEFAULT_REFERENCE_ENCODING: &str = "latin1";

pub const DEFAULT_REFERENCE_DELIMITER: char = ';';

pub const DEFAULT_OUTPUT_DELIMITER: char = ';';

pub const DEFAULT_OUTPUT_PREFIX: &str = "datos_consolidados";

pub const DEFAULT_TABLE_NAME: &str = "datos_consolidados";

/// chrono format of the run identifier embedded in output file names
pub const RUN_ID_FORMAT: &str = "%Y%m%d%H%M%S";
