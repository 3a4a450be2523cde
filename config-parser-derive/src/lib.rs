//! `#[derive(FromYaml)]` for plain structs, targeting
//! `config_parser::FromYaml`. Walks the raw `TokenStream` by hand
//! (no `syn`/`quote`) — this crate has exactly one dependency and it
//! is the trait it derives for.

extern crate proc_macro;
use proc_macro::{Delimiter, TokenStream, TokenTree};

struct FieldInfo {
    name: String,
    is_option: bool,
    default: Option<String>,
}

#[proc_macro_derive(FromYaml, attributes(field))]
pub fn derive_from_yaml(input: TokenStream) -> TokenStream {
    let tokens: Vec<TokenTree> = input.into_iter().collect();
    let mut struct_name = String::new();
    let mut fields = Vec::new();
    let mut pending_default = None;

    for i in 0..tokens.len() {
        if let TokenTree::Ident(ref ident) = tokens[i]
            && ident.to_string() == "struct"
            && let Some(TokenTree::Ident(name)) = tokens.get(i + 1)
        {
            struct_name = name.to_string();
        }

        if let TokenTree::Group(ref group) = tokens[i]
            && group.delimiter() == Delimiter::Brace
        {
            let inner: Vec<TokenTree> = group.stream().into_iter().collect();
            for j in 0..inner.len() {
                if let TokenTree::Punct(ref p) = inner[j] {
                    if p.as_char() == '#' {
                        if let Some(TokenTree::Group(g)) = inner.get(j + 1)
                            && g.delimiter() == Delimiter::Bracket
                        {
                            let attr_tokens: Vec<TokenTree> = g.stream().into_iter().collect();
                            if attr_tokens.len() >= 2
                                && let TokenTree::Ident(ref attr_ident) = attr_tokens[0]
                                && attr_ident.to_string() == "field"
                                && let TokenTree::Group(ref attr_group) = attr_tokens[1]
                                && attr_group.delimiter() == Delimiter::Parenthesis
                            {
                                let attr_inner: Vec<TokenTree> =
                                    attr_group.stream().into_iter().collect();
                                for k in 0..attr_inner.len() {
                                    if let TokenTree::Ident(ref key_ident) = attr_inner[k]
                                        && key_ident.to_string() == "default"
                                        && let Some(TokenTree::Punct(ref eq)) = attr_inner.get(k + 1)
                                        && eq.as_char() == '='
                                        && let Some(TokenTree::Literal(lit)) = attr_inner.get(k + 2)
                                    {
                                        pending_default = Some(lit.to_string());
                                    }
                                }
                            }
                        }
                        continue;
                    }
                }

                if let TokenTree::Punct(ref p) = inner[j]
                    && p.as_char() == ':'
                    && j > 0
                    && let TokenTree::Ident(ref field_ident) = inner[j - 1]
                {
                    let field_name = field_ident.to_string();
                    if field_name == "pub" || field_name == "crate" {
                        continue;
                    }

                    let mut is_option = false;
                    let mut k = j + 1;
                    while k < inner.len() {
                        let token_str = inner[k].to_string();
                        if token_str == "," {
                            break;
                        }
                        if token_str == "Option" {
                            is_option = true;
                            break;
                        }
                        k += 1;
                    }

                    fields.push(FieldInfo { name: field_name, is_option, default: pending_default.take() });
                }
            }
        }
    }

    let mut slots = String::new();
    let mut handlers = String::new();
    let mut build = String::new();

    for field in &fields {
        let name = &field.name;
        slots.push_str(&format!("let mut __{name}: ::std::option::Option<_> = ::std::option::Option::None;\n"));
        handlers.push_str(&format!(
            "\"{name}\" => {{ __{name} = ::std::option::Option::Some(config_parser::FromYaml::from_yaml(__p, __min_indent)?); ::std::result::Result::Ok(true) }}\n"
        ));

        if field.is_option {
            build.push_str(&format!("{name}: __{name},\n"));
        } else if let Some(def) = &field.default {
            let literal = def.trim_matches('"');
            build.push_str(&format!(
                "{name}: match __{name} {{ ::std::option::Option::Some(v) => v, ::std::option::Option::None => ::std::convert::Into::into({lit:?}) }},\n",
                lit = literal
            ));
        } else {
            build.push_str(&format!(
                "{name}: __{name}.ok_or_else(|| config_parser::ConfigError::new(\"missing required field `{name}`\", ::std::option::Option::None))?,\n"
            ));
        }
    }

    let generated = format!(
        "impl config_parser::FromYaml for {name} {{
            fn from_yaml(__p: &mut config_parser::ConfigParser, __min_indent: usize) -> config_parser::ParseResult<Self> {{
                {slots}
                __p.parse_struct(__min_indent, |__p, __key| {{
                    match __key {{
                        {handlers}
                        _ => ::std::result::Result::Ok(false),
                    }}
                }})?;
                ::std::result::Result::Ok(Self {{ {build} }})
            }}
        }}",
        name = struct_name,
    );

    generated.parse().expect("generated FromYaml impl was invalid")
}
