use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;

pub const FECHA: &str = "FECHA";
pub const FACTURA: &str = "FACTURA";
pub const CAMION_ID: &str = "CAMION_ID";
pub const BROKER: &str = "BROKER";
pub const CAMION_NUM: &str = "CAMION_NUM";
pub const TICKET: &str = "TICKET";
pub const CLIENTE: &str = "CLIENTE";
pub const PROYECTO: &str = "PROYECTO";
pub const PROYECTO_OK: &str = "PROYECTO_OK";
pub const HORAS_VIAJE: &str = "HORAS_VIAJE";
pub const COSTO_UNITARIO: &str = "COSTO_UNITARIO";
pub const TOTAL_COBRADO: &str = "TOTAL_COBRADO";
pub const PAGO_BROKER: &str = "PAGO_BROKER";
pub const ACUMULADO: &str = "ACUMULADO";
pub const PERIODO: &str = "PERIODO";

/// Column vocabulary of one dashboard variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Raw invoice sheet, one row per trip or billed hour block
    #[default]
    Invoices,
    /// Income vs cost sheet of the combined workbook
    Combined,
}

impl Layout {
    pub fn default_sheet(self) -> &'static str {
        match self {
            Layout::Invoices => "Facturas Generales",
            Layout::Combined => "Ingresos_vs_Costos",
        }
    }

    /// Column whose value echoes the header on duplicated header rows
    pub fn discriminator(self) -> &'static str {
        FACTURA
    }

    fn aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Layout::Invoices => &[
                ("Fecha", FECHA),
                ("Factura", FACTURA),
                ("Truck", CAMION_ID),
                ("Broker", BROKER),
                ("Camion", CAMION_NUM),
                ("Ticket", TICKET),
                ("Clientes", CLIENTE),
                ("Proyecto", PROYECTO),
                ("Proyecto OK", PROYECTO_OK),
                ("Horas o Viaje", HORAS_VIAJE),
                ("Costo unitario", COSTO_UNITARIO),
                ("Total Cobrado", TOTAL_COBRADO),
                ("Pago a Broker", PAGO_BROKER),
                ("Unamed", ACUMULADO),
            ],
            Layout::Combined => &[
                ("FECHA_FACTURA", FECHA),
                ("TOTAL_INGRESOS", TOTAL_COBRADO),
                ("TOTAL_COSTOS", PAGO_BROKER),
            ],
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Invoices => write!(f, "invoices"),
            Layout::Combined => write!(f, "combined"),
        }
    }
}

impl FromStr for Layout {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoices" => Ok(Layout::Invoices),
            "combined" => Ok(Layout::Combined),
            other => Err(DashboardError::UnknownLayout(other.to_string())),
        }
    }
}

/// Maps trimmed source headers onto canonical column names.
///
/// Headers without an entry pass through trimmed but otherwise unchanged.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    aliases: HashMap<String, String>,
}

impl ColumnMap {
    pub fn for_layout(layout: Layout) -> Self {
        let aliases = layout
            .aliases()
            .iter()
            .map(|(header, canonical)| (header.to_string(), canonical.to_string()))
            .collect();
        Self { aliases }
    }

    /// Add configured aliases; they take precedence over the built-in table
    pub fn with_aliases(mut self, extra: &BTreeMap<String, String>) -> Self {
        for (header, canonical) in extra {
            self.aliases
                .insert(header.trim().to_string(), canonical.trim().to_string());
        }
        self
    }

    pub fn canonical(&self, header: &str) -> String {
        let header = header.trim();
        self.aliases
            .get(header)
            .cloned()
            .unwrap_or_else(|| header.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_headers_map_to_canonical_names() {
        let map = ColumnMap::for_layout(Layout::Invoices);
        assert_eq!(map.canonical("Truck"), CAMION_ID);
        assert_eq!(map.canonical("  Total Cobrado "), TOTAL_COBRADO);
        assert_eq!(map.canonical("Proyecto OK"), PROYECTO_OK);
        assert_eq!(map.canonical("Unamed"), ACUMULADO);
    }

    #[test]
    fn unmapped_headers_pass_through_trimmed() {
        let map = ColumnMap::for_layout(Layout::Invoices);
        assert_eq!(map.canonical(" Notas "), "Notas");
        // Matching is exact, not case-folded
        assert_eq!(map.canonical("truck"), "truck");
    }

    #[test]
    fn combined_layout_renames_totals() {
        let map = ColumnMap::for_layout(Layout::Combined);
        assert_eq!(map.canonical("TOTAL_INGRESOS"), TOTAL_COBRADO);
        assert_eq!(map.canonical("TOTAL_COSTOS"), PAGO_BROKER);
        assert_eq!(map.canonical("CLIENTE"), CLIENTE);
    }

    #[test]
    fn configured_aliases_override_builtins() {
        let mut extra = BTreeMap::new();
        extra.insert("Cliente Final".to_string(), CLIENTE.to_string());
        extra.insert("Clientes".to_string(), "CLIENTE_ORIGINAL".to_string());
        let map = ColumnMap::for_layout(Layout::Invoices).with_aliases(&extra);
        assert_eq!(map.canonical("Cliente Final"), CLIENTE);
        assert_eq!(map.canonical("Clientes"), "CLIENTE_ORIGINAL");
    }

    #[test]
    fn layout_parses_from_str() {
        assert_eq!("Combined".parse::<Layout>().unwrap(), Layout::Combined);
        assert!(matches!(
            "pivot".parse::<Layout>(),
            Err(DashboardError::UnknownLayout(name)) if name == "pivot"
        ));
    }
}
