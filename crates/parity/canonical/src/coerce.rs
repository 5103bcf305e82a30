use parity_types::Scalar;

/// Coerce a raw token to the most specific scalar.
///
/// Tokens without a decimal point become integers when they parse as one,
/// tokens with a decimal point become floats when they parse as one, and
/// everything else stays a string. `0`/`1` flags are left as integers.
pub fn coerce_scalar(token: &str) -> Scalar {
    if token.contains('.') {
        token
            .parse::<f64>()
            .map(Scalar::Float)
            .unwrap_or_else(|_| Scalar::Str(token.to_string()))
    } else {
        token
            .parse::<i64>()
            .map(Scalar::Int)
            .unwrap_or_else(|_| Scalar::Str(token.to_string()))
    }
}
