//! Classification rule tables and parameters
//!
//! All lookup tables are plain data handed to the builders, so deployments
//! can swap them without touching classification logic. The defaults mirror
//! the Brazilian e-commerce source the warehouse was first built for.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::dimensions::Region;

/// Customer segmentation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationRules {
    /// Orders at or above this count are VIP
    pub vip_min_orders: u32,
    /// Upper bound of the Returning band
    pub returning_max_orders: u32,
    /// Accumulated spend above this is VIP regardless of order count
    pub vip_min_spend: Decimal,
}

impl Default for SegmentationRules {
    fn default() -> Self {
        Self {
            vip_min_orders: 6,
            returning_max_orders: 5,
            vip_min_spend: Decimal::from(5000),
        }
    }
}

/// Parameters of the lifetime-value projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClvParams {
    /// Assumed customer lifespan used to annualize purchase frequency
    pub estimated_lifespan_days: i64,
}

impl Default for ClvParams {
    fn default() -> Self {
        Self {
            estimated_lifespan_days: 730,
        }
    }
}

/// Fallback group for categories absent from the table
pub const CATEGORY_GROUP_OTHER: &str = "Other";
/// Group for products with no category at all
pub const CATEGORY_GROUP_UNCATEGORIZED: &str = "Uncategorized";
/// Fallback category for payment types absent from the table
pub const PAYMENT_CATEGORY_OTHER: &str = "Other";

static REGION_TABLE: Lazy<BTreeMap<String, Region>> = Lazy::new(|| {
    let mut table = BTreeMap::new();
    for state in ["AC", "AM", "AP", "PA", "RO", "RR", "TO"] {
        table.insert(state.to_string(), Region::North);
    }
    for state in ["AL", "BA", "CE", "MA", "PB", "PE", "PI", "RN", "SE"] {
        table.insert(state.to_string(), Region::Northeast);
    }
    for state in ["DF", "GO", "MS", "MT"] {
        table.insert(state.to_string(), Region::CentralWest);
    }
    for state in ["ES", "MG", "RJ", "SP"] {
        table.insert(state.to_string(), Region::Southeast);
    }
    for state in ["PR", "RS", "SC"] {
        table.insert(state.to_string(), Region::South);
    }
    table
});

/// Default state-code → region table (27 Brazilian state codes, 5 regions)
pub fn default_region_table() -> BTreeMap<String, Region> {
    REGION_TABLE.clone()
}

static CATEGORY_GROUPS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let groups: &[(&str, &[&str])] = &[
        (
            "Electronics",
            &[
                "informatica_acessorios",
                "telefonia",
                "telefonia_fixa",
                "eletronicos",
                "tablets_impressao_imagem",
                "pcs",
                "consoles_games",
                "audio",
                "cine_foto",
            ],
        ),
        (
            "Home & Furniture",
            &[
                "cama_mesa_banho",
                "moveis_decoracao",
                "utilidades_domesticas",
                "eletrodomesticos",
                "casa_construcao",
                "climatizacao",
                "moveis_sala",
                "moveis_escritorio",
                "moveis_quarto",
                "casa_conforto",
            ],
        ),
        (
            "Fashion & Beauty",
            &[
                "beleza_saude",
                "perfumaria",
                "fashion_bolsas_e_acessorios",
                "fashion_calcados",
                "fashion_esporte",
                "fashion_roupa_masculina",
                "fashion_roupa_feminina",
                "relogios_presentes",
            ],
        ),
        (
            "Sports & Leisure",
            &["esporte_lazer", "brinquedos", "bebes", "pet_shop", "fraldas_higiene"],
        ),
        (
            "Books & Media",
            &[
                "livros_interesse_geral",
                "livros_tecnicos",
                "livros_importados",
                "dvds_blu_ray",
                "cds_dvds_musicais",
                "musica",
                "papelaria",
                "artes_e_artesanato",
                "artes",
            ],
        ),
        (
            "Automotive & Tools",
            &[
                "automotivo",
                "ferramentas_jardim",
                "construcao_ferramentas_construcao",
                "construcao_ferramentas_iluminacao",
                "construcao_ferramentas_seguranca",
                "construcao_ferramentas_jardim",
                "sinalizacao_e_seguranca",
            ],
        ),
        (
            "Food & Drinks",
            &["alimentos_bebidas", "alimentos", "portateis_cozinha_e_preparadores_de_alimentos"],
        ),
        (
            "Gifts & Party",
            &["artigos_de_festas", "artigos_de_natal", "flores", "cool_stuff"],
        ),
        (
            "Business & Industry",
            &[
                "industria_comercio_e_negocios",
                "agro_industria_e_comercio",
                "instrumentos_musicais",
            ],
        ),
        ("Services", &["seguros_e_servicos", "market_place"]),
    ];

    let mut table = BTreeMap::new();
    for (group, categories) in groups {
        for category in *categories {
            table.insert(category.to_string(), group.to_string());
        }
    }
    table
});

/// Default category → category-group table
pub fn default_category_groups() -> BTreeMap<String, String> {
    CATEGORY_GROUPS.clone()
}

static PAYMENT_CATEGORIES: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [
        ("credit_card", "Credit"),
        ("debit_card", "Debit"),
        ("boleto", "Cash/Banking"),
        ("voucher", "Voucher"),
        ("not_defined", "Unknown"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

/// Default payment type → category table
pub fn default_payment_categories() -> BTreeMap<String, String> {
    PAYMENT_CATEGORIES.clone()
}

/// Default holiday calendar: Brazilian national holidays, 2016–2018
pub fn default_holidays() -> Vec<NaiveDate> {
    const DATES: &[(i32, u32, u32)] = &[
        (2016, 1, 1),
        (2016, 2, 8),
        (2016, 2, 9),
        (2016, 3, 25),
        (2016, 4, 21),
        (2016, 5, 1),
        (2016, 9, 7),
        (2016, 10, 12),
        (2016, 11, 2),
        (2016, 11, 15),
        (2016, 12, 25),
        (2017, 1, 1),
        (2017, 2, 27),
        (2017, 2, 28),
        (2017, 4, 14),
        (2017, 4, 21),
        (2017, 5, 1),
        (2017, 9, 7),
        (2017, 10, 12),
        (2017, 11, 2),
        (2017, 11, 15),
        (2017, 12, 25),
        (2018, 1, 1),
        (2018, 2, 12),
        (2018, 2, 13),
        (2018, 3, 30),
        (2018, 4, 21),
        (2018, 5, 1),
        (2018, 9, 7),
        (2018, 10, 12),
        (2018, 11, 2),
        (2018, 11, 15),
        (2018, 12, 25),
    ];
    DATES
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}
