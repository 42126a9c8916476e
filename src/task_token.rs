use std::fmt::{Debug, Display, Formatter};

/// Opaque token identifying one activity task attempt to the service
#[derive(Hash, Eq, PartialEq, Clone, Default, derive_more::From, derive_more::Into)]
pub struct TaskToken(pub Vec<u8>);

impl TaskToken {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for TaskToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&fmt_tt(&self.0))
    }
}

impl Debug for TaskToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskToken({})", fmt_tt(&self.0))
    }
}

pub fn fmt_tt(tt: &[u8]) -> String {
    base64::encode(tt)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn displays_as_base64() {
        let tt = TaskToken::from(vec![1, 2, 3]);
        assert_eq!(tt.to_string(), "AQID");
        assert_eq!(format!("{:?}", tt), "TaskToken(AQID)");
    }
}
