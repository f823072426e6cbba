//! Keywords of the app-module language.

#![allow(non_upper_case_globals)]

crate::prelude!();

macro_rules! build_keywords {
    {
        $(
            $(#[$mod_meta:meta])*
            $mod_ident:ident {
                $(
                    $(#[$kw_meta:meta])*
                    $kw_ident:ident : $kw_str:expr
                ),*
                $(,)?
            }
        )*
    } => {
        $(
            $(#[$mod_meta])*
            pub mod $mod_ident {
                $(
                    $(#[$kw_meta])*
                    pub const $kw_ident: &str = $kw_str;
                )*
            }
        )*

        lazy_static::lazy_static! {
            /// Set of all the keywords.
            pub static ref all: Set<&'static str> = {
                let mut set = Set::new();
                $($(
                    let is_new = set.insert($kw_str);
                    if !is_new {
                        panic!("[internal] keyword `{}` is defined twice", $kw_str)
                    }
                )*)*
                set
            };
        }
    };
}

build_keywords! {
    /// Statement keywords.
    stmt {
        /// Function declaration.
        fun: "fn",
        /// Local declaration.
        let_: "let",
        /// Conditional.
        if_: "if",
        /// Else branch.
        else_: "else",
        /// Return.
        ret: "return",
        /// No-op.
        pass: "pass",
    }
    /// Expression keywords.
    expr {
        /// Conjunction.
        and: "and",
        /// Disjunction.
        or: "or",
        /// Negation.
        not: "not",
        /// No value.
        none: "None",
        /// True, python-style.
        tru: "True",
        /// False, python-style.
        fls: "False",
        /// True.
        tru_lc: "true",
        /// False.
        fls_lc: "false",
    }
}
