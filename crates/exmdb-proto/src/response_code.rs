//! [`ResponseCode`]: the status byte leading every response frame
//! (spec.md §4.5/§6).

use binrw::prelude::*;

macro_rules! make_response_code {
    ($($name:ident = $value:literal: $description:literal,)+) => {
        #[binrw::binrw]
        #[brw(repr(u8))]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ResponseCode {
            $(
                #[doc = $description]
                $name = $value,
            )+
        }

        impl std::fmt::Display for ResponseCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let description = match self {
                    $(ResponseCode::$name => $description,)+
                };
                write!(f, "{description} ({:#04x})", *self as u8)
            }
        }

        impl TryFrom<u8> for ResponseCode {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                use binrw::io::Cursor;
                ResponseCode::read_le(&mut Cursor::new([value])).map_err(|_| value)
            }
        }
    };
}

make_response_code! {
    Success = 0: "Success",
    AccessDeny = 1: "Access Denied",
    MaxReached = 2: "Connection Limit Reached",
    LackMemory = 3: "Out of Memory",
    MisconfigPrefix = 4: "Misconfigured Prefix",
    MisconfigMode = 5: "Misconfigured Store Mode",
    ConnectIncomplete = 6: "Connect Incomplete",
    PullError = 7: "Pull Error",
    DispatchError = 8: "Dispatch Error",
    PushError = 9: "Push Error",
}

impl ResponseCode {
    pub fn is_success(self) -> bool {
        self == ResponseCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_known_and_unknown_codes() {
        assert_eq!(ResponseCode::try_from(0).unwrap(), ResponseCode::Success);
        assert_eq!(ResponseCode::try_from(8).unwrap(), ResponseCode::DispatchError);
        assert_eq!(ResponseCode::try_from(200), Err(200));
    }

    #[test]
    fn display_includes_hex_code() {
        assert_eq!(format!("{}", ResponseCode::DispatchError), "Dispatch Error (0x08)");
    }
}
