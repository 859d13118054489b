mod reference;

pub(crate) use reference::{parse_amount, read_reference, ReferenceDistribution};
