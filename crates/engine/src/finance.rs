//! Derived financial metrics. Pure functions of a record's raw attributes,
//! recomputed on demand. Divisions guard non-positive denominators: ratios
//! that would be misleading at zero are absent, coverage ratios are a defined
//! zero.

use serde::Serialize;

use crate::model::Record;

// Applied when the corresponding input is absent.
pub const DEFAULT_DOWN_PERCENT: f64 = 25.0;
pub const DEFAULT_RATE_PERCENT: f64 = 6.5;
pub const DEFAULT_TERM_YEARS: f64 = 30.0;

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

/// Principal after down payment; the down fraction is clamped to [0, 100].
pub fn loan_amount(price: f64, down_percent: f64) -> f64 {
    if !price.is_finite() || !down_percent.is_finite() {
        return 0.0;
    }
    let dp = down_percent.clamp(0.0, 100.0);
    (price * (1.0 - dp / 100.0)).max(0.0)
}

/// Fixed-rate amortized monthly payment. A negative rate is treated as zero,
/// and a zero monthly rate degenerates to straight division, avoiding the
/// amortization formula's division by zero.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: f64) -> f64 {
    let months = (term_years * 12.0).round().max(1.0);
    if !principal.is_finite() || principal <= 0.0 || !annual_rate_percent.is_finite() {
        return 0.0;
    }
    let rate = annual_rate_percent.max(0.0) / 100.0 / 12.0;
    if rate == 0.0 {
        principal / months
    } else {
        principal * (rate / (1.0 - (1.0 + rate).powf(-months)))
    }
}

pub fn monthly_taxes(price: f64, tax_rate_percent: f64) -> f64 {
    if !price.is_finite() || !tax_rate_percent.is_finite() || price <= 0.0 || tax_rate_percent < 0.0
    {
        return 0.0;
    }
    price * (tax_rate_percent / 100.0) / 12.0
}

pub fn total_interest(monthly: f64, principal: f64, term_years: f64) -> f64 {
    let months = (term_years * 12.0).round().max(1.0);
    if monthly <= 0.0 || principal <= 0.0 {
        return 0.0;
    }
    monthly * months - principal
}

// ---------------------------------------------------------------------------
// Land
// ---------------------------------------------------------------------------

/// Unit price per acre; absent unless both acres and price are strictly
/// positive.
pub fn price_per_acre(record: &Record) -> Option<f64> {
    let acres = record.number("Acres")?;
    let price = record.number("Price")?;
    (acres > 0.0 && price > 0.0).then(|| price / acres)
}

// ---------------------------------------------------------------------------
// Multi-unit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMetrics {
    /// Effective gross income, annual.
    pub egi: f64,
    /// Net operating income, annual.
    pub noi: f64,
    pub loan_amount: f64,
    pub monthly_pi: f64,
    pub annual_debt: f64,
    /// NOI / price; 0 when price is not positive.
    pub cap_rate: f64,
    /// NOI / annual debt service; 0 when there is no debt service.
    pub dscr: f64,
    pub price_per_unit: Option<f64>,
}

pub fn derive_multi(record: &Record) -> MultiMetrics {
    let units = record.number("Units").unwrap_or(0.0);
    let rent = record.number("RentPerUnit").unwrap_or(0.0);
    // Zero is the correct neutral for vacancy and other income.
    let vacancy = record
        .number("VacancyPercent")
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);
    let other_monthly = record.number("OtherIncomeMonthly").unwrap_or(0.0);
    let taxes = record.number("TaxesAnnual").unwrap_or(0.0);
    let insurance = record.number("InsuranceAnnual").unwrap_or(0.0);
    let opex = record.number("OpExAnnual").unwrap_or(0.0);
    let price = record.number("Price").unwrap_or(0.0);
    let down = record
        .number("DownPercent")
        .unwrap_or(DEFAULT_DOWN_PERCENT)
        .clamp(0.0, 100.0);
    let rate = record.number("RatePercent").unwrap_or(DEFAULT_RATE_PERCENT);
    let term = record
        .number("TermYears")
        .unwrap_or(DEFAULT_TERM_YEARS)
        .max(1.0);

    let egi = units * rent * 12.0 * (1.0 - vacancy / 100.0) + other_monthly * 12.0;
    let noi = egi - taxes - insurance - opex;
    let loan = loan_amount(price, down);
    let monthly_pi = monthly_payment(loan, rate, term);
    let annual_debt = monthly_pi * 12.0;

    MultiMetrics {
        egi,
        noi,
        loan_amount: loan,
        monthly_pi,
        annual_debt,
        cap_rate: if price > 0.0 { noi / price } else { 0.0 },
        dscr: if annual_debt > 0.0 { noi / annual_debt } else { 0.0 },
        price_per_unit: (units > 0.0).then(|| price / units),
    }
}

// ---------------------------------------------------------------------------
// Single-family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleMetrics {
    pub price_per_sqft: Option<f64>,
    /// Annual rent estimate / price.
    pub rent_yield: Option<f64>,
}

pub fn derive_single(record: &Record) -> SingleMetrics {
    let sqft = record.number("Sqft").unwrap_or(0.0);
    let price = record.number("Price").unwrap_or(0.0);
    let rent = record.number("RentZestimate").unwrap_or(0.0);
    SingleMetrics {
        price_per_sqft: (sqft > 0.0).then(|| price / sqft),
        rent_yield: (price > 0.0).then(|| rent * 12.0 / price),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn multi(pairs: &[(&str, f64)]) -> Record {
        let mut r = Record::default();
        for (k, v) in pairs {
            r.numbers.insert(k.to_string(), *v);
        }
        r
    }

    #[test]
    fn zero_rate_is_straight_division() {
        let payment = monthly_payment(120_000.0, 0.0, 30.0);
        assert_eq!(payment, 120_000.0 / 360.0);
    }

    #[test]
    fn negative_rate_clamps_to_zero() {
        assert_eq!(monthly_payment(120_000.0, -3.0, 30.0), 120_000.0 / 360.0);
        assert!(monthly_payment(120_000.0, -3.0, 30.0) > 0.0);
    }

    #[test]
    fn amortized_payment_standard_case() {
        // 200k at 6% over 30y: well-known ballpark ~1199.10/mo.
        let payment = monthly_payment(200_000.0, 6.0, 30.0);
        assert!((payment - 1199.10).abs() < 0.01, "got {payment}");
    }

    #[test]
    fn loan_amount_clamps_down_percent() {
        assert_eq!(loan_amount(100_000.0, 150.0), 0.0);
        assert_eq!(loan_amount(100_000.0, -5.0), 100_000.0);
        assert_eq!(loan_amount(100_000.0, 25.0), 75_000.0);
    }

    #[test]
    fn ratios_defined_zero_at_zero_price() {
        let m = derive_multi(&multi(&[
            ("Units", 6.0),
            ("RentPerUnit", 1400.0),
            ("Price", 0.0),
        ]));
        assert_eq!(m.cap_rate, 0.0);
        assert!(m.cap_rate.is_finite());
        assert!(m.dscr.is_finite());
        assert_eq!(m.price_per_unit, Some(0.0));
    }

    #[test]
    fn dscr_zero_without_debt_service() {
        let m = derive_multi(&multi(&[
            ("Units", 4.0),
            ("RentPerUnit", 1800.0),
            ("Price", 0.0),
            ("DownPercent", 100.0),
        ]));
        assert_eq!(m.annual_debt, 0.0);
        assert_eq!(m.dscr, 0.0);
    }

    #[test]
    fn multi_derivation_worked_example() {
        // 6 units at 1400 with 5% vacancy: EGI = 6*1400*12*0.95 = 95_760.
        let m = derive_multi(&multi(&[
            ("Units", 6.0),
            ("RentPerUnit", 1400.0),
            ("VacancyPercent", 5.0),
            ("TaxesAnnual", 12_000.0),
            ("InsuranceAnnual", 3_800.0),
            ("OpExAnnual", 10_500.0),
            ("Price", 850_000.0),
            ("DownPercent", 25.0),
            ("RatePercent", 6.75),
            ("TermYears", 30.0),
        ]));
        assert!((m.egi - 95_760.0).abs() < 1e-9);
        assert!((m.noi - 69_460.0).abs() < 1e-9);
        assert!((m.cap_rate - 69_460.0 / 850_000.0).abs() < 1e-12);
        assert_eq!(m.price_per_unit, Some(850_000.0 / 6.0));
        assert!(m.dscr > 0.0);
    }

    #[test]
    fn price_per_acre_guards() {
        let mut r = Record::default();
        assert_eq!(price_per_acre(&r), None);
        r.numbers.insert("Acres".into(), 10.0);
        r.numbers.insert("Price".into(), 100_000.0);
        assert_eq!(price_per_acre(&r), Some(10_000.0));
        r.numbers.insert("Acres".into(), 0.0);
        assert_eq!(price_per_acre(&r), None);
    }

    #[test]
    fn single_family_metrics() {
        let mut r = Record::default();
        r.numbers.insert("Sqft".into(), 2000.0);
        r.numbers.insert("Price".into(), 400_000.0);
        r.numbers.insert("RentZestimate".into(), 2500.0);
        let s = derive_single(&r);
        assert_eq!(s.price_per_sqft, Some(200.0));
        assert_eq!(s.rent_yield, Some(2500.0 * 12.0 / 400_000.0));

        let empty = derive_single(&Record::default());
        assert_eq!(empty.price_per_sqft, None);
        assert_eq!(empty.rent_yield, None);
    }

    #[test]
    fn total_interest_and_taxes() {
        let monthly = monthly_payment(100_000.0, 0.0, 10.0);
        assert!(total_interest(monthly, 100_000.0, 10.0).abs() < 1e-6);
        assert_eq!(monthly_taxes(600_000.0, 1.2), 600.0);
        assert_eq!(monthly_taxes(0.0, 1.2), 0.0);
    }
}
