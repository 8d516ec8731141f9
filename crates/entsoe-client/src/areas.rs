//! Bidding zone and control area codes.

/// A bidding zone or control area known to the transparency platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    /// EIC code used in queries and documents.
    pub code: &'static str,
    /// Short label (e.g., "DE_LU").
    pub short_name: &'static str,
    /// Display name.
    pub name: &'static str,
}

const fn area(code: &'static str, short_name: &'static str, name: &'static str) -> Area {
    Area {
        code,
        short_name,
        name,
    }
}

/// Areas we can name in newsletters.
pub const AREAS: &[Area] = &[
    area("10Y1001A1001A82H", "DE_LU", "Germany-Luxembourg"),
    area("10Y1001A1001A83F", "DE", "Germany"),
    area("10Y1001A1001A63L", "DE_AT_LU", "Germany-Austria-Luxembourg"),
    area("10YAT-APG------L", "AT", "Austria"),
    area("10YBE----------2", "BE", "Belgium"),
    area("10YNL----------L", "NL", "Netherlands"),
    area("10YFR-RTE------C", "FR", "France"),
    area("10YCH-SWISSGRIDZ", "CH", "Switzerland"),
    area("10YCZ-CEPS-----N", "CZ", "Czech Republic"),
    area("10YPL-AREA-----S", "PL", "Poland"),
    area("10YDK-1--------W", "DK_1", "Denmark West (DK1)"),
    area("10YDK-2--------M", "DK_2", "Denmark East (DK2)"),
    area("10YNO-1--------2", "NO_1", "Norway (NO1)"),
    area("10YNO-2--------T", "NO_2", "Norway (NO2)"),
    area("10YNO-3--------J", "NO_3", "Norway (NO3)"),
    area("10YNO-4--------9", "NO_4", "Norway (NO4)"),
    area("10Y1001A1001A48H", "NO_5", "Norway (NO5)"),
    area("10Y1001A1001A44P", "SE_1", "Sweden (SE1)"),
    area("10Y1001A1001A45N", "SE_2", "Sweden (SE2)"),
    area("10Y1001A1001A46L", "SE_3", "Sweden (SE3)"),
    area("10Y1001A1001A47J", "SE_4", "Sweden (SE4)"),
    area("10YFI-1--------U", "FI", "Finland"),
    area("10Y1001A1001A39I", "EE", "Estonia"),
    area("10YLV-1001A00074", "LV", "Latvia"),
    area("10YLT-1001A0008Q", "LT", "Lithuania"),
    area("10YES-REE------0", "ES", "Spain"),
    area("10YPT-REN------W", "PT", "Portugal"),
    area("10YGB----------A", "GB", "Great Britain"),
    area("10Y1001A1001A59C", "IE_SEM", "Ireland (SEM)"),
    area("10Y1001A1001A73I", "IT_NORD", "Italy North"),
    area("10YHU-MAVIR----U", "HU", "Hungary"),
    area("10YSI-ELES-----O", "SI", "Slovenia"),
    area("10YSK-SEPS-----K", "SK", "Slovakia"),
];

/// Find an area by EIC code.
pub fn lookup(code: &str) -> Option<&'static Area> {
    let code = code.trim();
    AREAS.iter().find(|a| a.code == code)
}

/// Display name for a region code.
///
/// Unknown codes are returned as-is; an empty code reads "unknown region".
pub fn region_name(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return "unknown region".to_string();
    }
    lookup(code)
        .map(|a| a.name.to_string())
        .unwrap_or_else(|| code.to_string())
}
