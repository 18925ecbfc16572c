//! The `macro` control structure and macro callables.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        context::Context,
        error::{
            Error,
            Result,
        },
        nodes::{
            Const,
            Expr,
            MacroDef,
            MacroParam,
            Template,
        },
        parser::{
            consts::{
                block as tag,
                exp,
            },
            Parser,
        },
        render::Renderer,
        statements::Statement,
        value::{
            Function,
            Signature,
            Value,
        },
    },
    std::{
        rc::Rc,
        sync::Arc,
    },
};

pub(crate)
fn parse(parser: &mut Parser<'_>, args: &mut Parser<'_>) -> Result<Statement> {
    let name = args.expect_name()?;
    let strict = parser.config().strict_undefined;

    let mut params: Vec<MacroParam> = Vec::new();
    args.expect_op(exp::LPAREN)?;
    loop {
        if args.match_op(exp::RPAREN)? {
            break;
        }

        let param = args.expect_name()?;
        if params.iter().any(|p| p.name == param.text) {
            return Err(Error::DuplicateParameter(
                param.text.clone(),
                param.coord,
                parser.name().to_owned(),
            ));
        }

        let (default, required) = if args.match_op(exp::ASSIGN)? {
            (args.parse_expression()?, false)
        }
        else if strict {
            (Expr::Undefined(param.text.clone(), param.clone()), true)
        }
        else {
            (Expr::Literal(Const::None, param.clone()), true)
        };

        params.push(MacroParam {
            name: param.text.clone(),
            default,
            required,
        });

        if !args.match_op(exp::COMMA)? {
            args.expect_op(exp::RPAREN)?;
            break;
        }
    }
    args.expect_end()?;

    let (body, mut end) = parser.wrap_until(&[ tag::ENDMACRO, ])?;
    if !end.is_end()? {
        let closing = end.expect_name()?;
        if closing.text != name.text {
            return Err(end.invalid(
                format!("macro '{}' closed by endmacro '{}'", name.text, closing.text),
                &closing,
            ));
        }
    }
    end.expect_end()?;

    let def = Arc::new(MacroDef {
        name: name.text.clone(),
        params,
        body,
        token: name,
    });
    parser.register_macro(def.clone());

    Ok(Statement::Macro(def))
}

/// Bind the macro `def` in `ctx`.
pub(crate)
fn define(r: &Renderer<'_>, def: &Arc<MacroDef>, ctx: &Rc<Context>) {
    let f = macro_function(r.template().clone(), def.clone(), r.globals().clone());
    ctx.set(def.name.as_str(), f);
}

/// The callable value of a macro.
///
/// It closes over its template and the data frame of the render it was
/// defined in, never over the frame it gets bound into.
pub(crate)
fn macro_function(template: Arc<Template>, def: Arc<MacroDef>, globals: Rc<Context>) -> Function {
    let signature = Signature::new(
        def.params.iter().map(|p| p.name.clone()).collect(),
        0,
    );
    let name = def.name.clone();

    Function::new(name, move |ev, args| {
        let frame = globals.inherit();
        for (name, other) in template.macros.iter() {
            let f = macro_function(template.clone(), other.clone(), globals.clone());
            frame.set(name.as_str(), f);
        }

        for (idx, param) in def.params.iter().enumerate() {
            let value = match args.arg(idx, &param.name) {
                Some(v) => v.clone(),
                None => ev.eval(&param.default),
            };
            frame.set(param.name.as_str(), value);
        }

        let mut renderer = match Renderer::nested(
            ev.env(),
            template.clone(),
            globals.clone(),
            ev.auto_escape(),
            ev.depth() + 1,
        ) {
            Ok(renderer) => renderer,
            Err(e) => return Value::Error(e),
        };

        let mut out = String::new();
        match renderer.render_wrapper(&def.body, &frame, &mut out) {
            Ok(()) => Value::safe(out),
            Err(e) => Value::Error(e.into_eval()),
        }
    }).with_signature(signature)
}
