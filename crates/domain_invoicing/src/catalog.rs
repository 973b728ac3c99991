//! Classification catalogs
//!
//! Service areas and audit error kinds are closed enums. Billers and
//! payers are validated names drawn from a configurable catalog seeded
//! with the hospital's current roster; free text never reaches an
//! invoice row.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// Service area an invoice belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceArea {
    Soat,
    Outpatient,
    Emergency,
    Hospitalization,
    Vaccination,
}

impl ServiceArea {
    /// All areas, in worklist display order
    pub fn all() -> [ServiceArea; 5] {
        [
            ServiceArea::Soat,
            ServiceArea::Outpatient,
            ServiceArea::Emergency,
            ServiceArea::Hospitalization,
            ServiceArea::Vaccination,
        ]
    }

    /// Human-facing label, as printed on worklists and reports
    pub fn label(&self) -> &'static str {
        match self {
            ServiceArea::Soat => "SOAT",
            ServiceArea::Outpatient => "Consulta Externa",
            ServiceArea::Emergency => "Urgencias",
            ServiceArea::Hospitalization => "Hospitalizacion",
            ServiceArea::Vaccination => "Vacunacion",
        }
    }
}

impl fmt::Display for ServiceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceArea {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceArea::all()
            .into_iter()
            .find(|area| area.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvoiceError::validation(format!("Unknown service area: {}", s)))
    }
}

/// Error classification assigned when an auditor returns an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BillingError,
    Tariff,
    Signatures,
    SupportingDocuments,
    ContractError,
    CrcError,
    SupportsMismatch,
    AuthorizationSupports,
    AuthorizationCode,
    MissingFolder,
    Reissue,
    PatientNameCorrection,
    AuthorizationOnInvoice,
}

impl ErrorKind {
    pub fn all() -> [ErrorKind; 13] {
        [
            ErrorKind::BillingError,
            ErrorKind::Tariff,
            ErrorKind::Signatures,
            ErrorKind::SupportingDocuments,
            ErrorKind::ContractError,
            ErrorKind::CrcError,
            ErrorKind::SupportsMismatch,
            ErrorKind::AuthorizationSupports,
            ErrorKind::AuthorizationCode,
            ErrorKind::MissingFolder,
            ErrorKind::Reissue,
            ErrorKind::PatientNameCorrection,
            ErrorKind::AuthorizationOnInvoice,
        ]
    }

    /// Label used by the audit team
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::BillingError => "ERROR DE FACTURACION",
            ErrorKind::Tariff => "TARIFA",
            ErrorKind::Signatures => "FIRMAS",
            ErrorKind::SupportingDocuments => "SOPORTES",
            ErrorKind::ContractError => "ERROR CONTRATO",
            ErrorKind::CrcError => "ERROR CRC",
            ErrorKind::SupportsMismatch => "SOPORTES NO COINCIDEN",
            ErrorKind::AuthorizationSupports => "SOPORTES DE AUTORIZACION",
            ErrorKind::AuthorizationCode => "CODIGO DE AUTORIZACION",
            ErrorKind::MissingFolder => "SIN CARPETA",
            ErrorKind::Reissue => "REFACTURAR",
            ErrorKind::PatientNameCorrection => "CORREGIR NOMBRES DE USUARIO",
            ErrorKind::AuthorizationOnInvoice => "AUTORIZACION EN LA FACTURA",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ErrorKind {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::all()
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvoiceError::validation(format!("Unknown error kind: {}", s)))
    }
}

/// A biller (legalizador) name validated against the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Biller(String);

impl Biller {
    /// Wraps a name that was validated when the row was first written
    ///
    /// Used when rehydrating stored rows; new input goes through
    /// [`Catalog::biller`].
    pub fn from_trusted(name: impl Into<String>) -> Self {
        Biller(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Biller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A payer (EPS/insurer) name validated against the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payer(String);

impl Payer {
    /// Wraps a name that was validated when the row was first written
    ///
    /// Used when rehydrating stored rows; new input goes through
    /// [`Catalog::payer`].
    pub fn from_trusted(name: impl Into<String>) -> Self {
        Payer(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registered billers and payers
///
/// The catalog is data, not code: names can be added at runtime and the
/// seeded roster merely reflects the current deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    billers: BTreeSet<String>,
    payers: BTreeSet<String>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded with the hospital's roster
    pub fn seeded() -> Self {
        let mut catalog = Self::new();
        for name in SEEDED_BILLERS {
            catalog.add_biller(*name);
        }
        for name in SEEDED_PAYERS {
            catalog.add_payer(*name);
        }
        catalog
    }

    /// Registers a biller name
    pub fn add_biller(&mut self, name: impl Into<String>) {
        self.billers.insert(name.into());
    }

    /// Registers a payer name
    pub fn add_payer(&mut self, name: impl Into<String>) {
        self.payers.insert(name.into());
    }

    /// Validates a biller name against the catalog
    pub fn biller(&self, name: &str) -> Result<Biller, InvoiceError> {
        if self.billers.contains(name) {
            Ok(Biller(name.to_string()))
        } else {
            Err(InvoiceError::validation(format!(
                "Unknown biller: {}",
                name
            )))
        }
    }

    /// Validates a payer name against the catalog
    pub fn payer(&self, name: &str) -> Result<Payer, InvoiceError> {
        if self.payers.contains(name) {
            Ok(Payer(name.to_string()))
        } else {
            Err(InvoiceError::validation(format!("Unknown payer: {}", name)))
        }
    }

    /// Registered biller names, sorted
    pub fn billers(&self) -> impl Iterator<Item = &str> {
        self.billers.iter().map(String::as_str)
    }

    /// Registered payer names, sorted
    pub fn payers(&self) -> impl Iterator<Item = &str> {
        self.payers.iter().map(String::as_str)
    }
}

const SEEDED_BILLERS: &[&str] = &[
    "ANDREA CEBALLOS",
    "ALEJANDRA BRAVO",
    "ALEJANDRA BURBANO",
    "ALEXIS ERAZO",
    "ANLLY HERNANDEZ",
    "BREYNER TEZ",
    "CAMILA IMBACHI",
    "CATHERIN NOVA",
    "CRISTIAN SAAVEDRA",
    "DALIANA SIERRA",
    "DANIEL DORADO",
    "DANY MORENO",
    "DIANA TELLEZ",
    "EMILCEN RODRIGUEZ",
    "FERNEY PULICHE",
    "GEAN VITERY",
    "GIOVANY PAZ",
    "JHOANA CARDENAS",
    "JHONY AYALA",
    "JUAN CUANTINDIOY",
    "JULIANA ARCINIEGAS",
    "KATHERINN PEREA",
    "LUCERO ESTRELLA",
    "LUCY MONTEZUMA",
    "LUISA OTALVARO",
    "LUZ TOBON",
    "MARGY POZO",
    "MARIA CASANOVA",
    "MARI CHAMORRO",
    "MARISOL BURGOS",
    "MAURICIO BURGOS",
    "MONICA CARVAJAL",
    "MONICA NASTACUAS",
    "NATALI LUCERO",
    "NICOLAS LEDESMA",
    "OSCAR MAYA",
    "ROSA ROMERO",
    "SOL BURBANO",
    "SULEIMA ACOSTA",
    "VIVIANA ROMO",
    "YESICA REVELO",
    "YINETH CLAROS",
    "YULLY GRIJALBA",
];

const SEEDED_PAYERS: &[&str] = &[
    "ADRES",
    "ASMET SALUD EPS SAS",
    "ASOCIACION MUTUAL SER",
    "AXA COLPATRIA SEGUROS DE VIDA S A ARL",
    "AXA COLPATRIA SEGUROS SA",
    "CAJACOPI EPS S.A.S",
    "COLMEDICA MEDICINA PREPAGADA",
    "EMSSANAR E.P.S S.A.S.",
    "ENTIDAD PROMOTORA DE SALUD FAMISANAR SA S",
    "ENTIDAD PROMOTORA DE SALUD SERVICIO OCCIDENTAL DE SALUD S.A. S.O.S.",
    "ESM BATALLON DE ASPC NO 12 GR FERNANDO SERRANO",
    "EPS FAMILIAR DE COLOMBIA S.A.S.",
    "EPS SANITAS S.A",
    "FIDEICOMISOS PATRIMONIOS AUTONOMOS FIDUCIARIA LA PREVISORA S.A.",
    "LA EQUIDAD SEGUROS SOAT",
    "LA PREVISORA SA COMPANIA DE SEGUROS",
    "MALLAMAS EPS",
    "MUNDIAL DE SEGUROS",
    "NUEVA EPS",
    "REGIONAL DE ASEGURAMIENTO EN SALUD NO 2",
    "SALUD TOTAL SA EPS ARS",
    "SAVIA SALUD EPS",
    "SEGUROS COMERCIALES BOLIVAR",
    "SEGUROS DE VIDA DEL ESTADO",
    "SEGUROS DE VIDA SURAMERICANA S.A",
    "SEGUROS DEL ESTADO",
    "SRIA DE SALUD DPTAL DEL PTYO",
    "SURA",
];
