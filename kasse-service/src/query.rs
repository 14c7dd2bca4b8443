//! Query shaping for list endpoints.
//!
//! Filter and order parameters are best-effort: a value that fails to parse
//! as the expected type drops that parameter instead of failing the request,
//! and an unrecognized order token falls back to the default listing order.

/// Parse an id filter value. Non-numeric input drops the filter.
pub fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.parse::<i64>().ok())
}

/// Parse an integer-boolean filter value: any integer is accepted, nonzero
/// means true. Non-integer input drops the filter.
pub fn parse_int_bool(raw: Option<&str>) -> Option<bool> {
    raw.and_then(|v| v.parse::<i64>().ok()).map(|v| v != 0)
}

/// Order tokens accepted by the purchase listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOrder {
    User,
    UserDesc,
    Date,
    DateDesc,
    BeverageType,
    BeverageTypeDesc,
}

impl PurchaseOrder {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "user" => Some(Self::User),
            "-user" => Some(Self::UserDesc),
            "date" => Some(Self::Date),
            "-date" => Some(Self::DateDesc),
            "beverage_type" => Some(Self::BeverageType),
            "-beverage_type" => Some(Self::BeverageTypeDesc),
            _ => None,
        }
    }

    /// ORDER BY fragment. Tokens are a closed set, never raw user input.
    pub fn sql(self) -> &'static str {
        match self {
            Self::User => "account_id ASC, id ASC",
            Self::UserDesc => "account_id DESC, id ASC",
            Self::Date => "date ASC, id ASC",
            Self::DateDesc => "date DESC, id ASC",
            Self::BeverageType => "beverage_type_id ASC, id ASC",
            Self::BeverageTypeDesc => "beverage_type_id DESC, id ASC",
        }
    }
}

/// Order tokens accepted by the account listing. The purchase-count orders
/// annotate each account with its purchase total and break ties by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOrder {
    Username,
    UsernameDesc,
    DateJoined,
    DateJoinedDesc,
    Purchases,
    PurchasesDesc,
}

impl AccountOrder {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "username" => Some(Self::Username),
            "-username" => Some(Self::UsernameDesc),
            "date_joined" => Some(Self::DateJoined),
            "-date_joined" => Some(Self::DateJoinedDesc),
            "purchases" => Some(Self::Purchases),
            "-purchases" => Some(Self::PurchasesDesc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Username => "username ASC",
            Self::UsernameDesc => "username DESC",
            Self::DateJoined => "date_joined ASC",
            Self::DateJoinedDesc => "date_joined DESC",
            Self::Purchases => "purchase_count ASC, id ASC",
            Self::PurchasesDesc => "purchase_count DESC, id ASC",
        }
    }
}

/// Order tokens for the grouped purchase counts. Anything unrecognized falls
/// back to ascending count, which is also the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountOrder {
    #[default]
    Count,
    CountDesc,
}

impl CountOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("-count") => Self::CountDesc,
            _ => Self::Count,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Count => "count ASC",
            Self::CountDesc => "count DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_filter_drops_non_numeric_values() {
        assert_eq!(parse_id(Some("42")), Some(42));
        assert_eq!(parse_id(Some("abc")), None);
        assert_eq!(parse_id(Some("4.2")), None);
        assert_eq!(parse_id(None), None);
    }

    #[test]
    fn int_bool_accepts_any_integer() {
        assert_eq!(parse_int_bool(Some("1")), Some(true));
        assert_eq!(parse_int_bool(Some("0")), Some(false));
        assert_eq!(parse_int_bool(Some("2")), Some(true));
        assert_eq!(parse_int_bool(Some("-1")), Some(true));
        assert_eq!(parse_int_bool(Some("true")), None);
        assert_eq!(parse_int_bool(None), None);
    }

    #[test]
    fn unknown_purchase_order_is_ignored() {
        assert_eq!(PurchaseOrder::parse(Some("price")), None);
        assert_eq!(
            PurchaseOrder::parse(Some("-date")),
            Some(PurchaseOrder::DateDesc)
        );
        assert_eq!(PurchaseOrder::parse(None), None);
    }

    #[test]
    fn account_order_tokens() {
        assert_eq!(
            AccountOrder::parse(Some("purchases")),
            Some(AccountOrder::Purchases)
        );
        assert_eq!(
            AccountOrder::parse(Some("-username")),
            Some(AccountOrder::UsernameDesc)
        );
        assert_eq!(AccountOrder::parse(Some("balance")), None);
    }

    #[test]
    fn count_order_defaults_to_ascending() {
        assert_eq!(CountOrder::parse(None), CountOrder::Count);
        assert_eq!(CountOrder::parse(Some("count")), CountOrder::Count);
        assert_eq!(CountOrder::parse(Some("-count")), CountOrder::CountDesc);
        assert_eq!(CountOrder::parse(Some("garbage")), CountOrder::Count);
    }
}
