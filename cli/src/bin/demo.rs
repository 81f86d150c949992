use mpasm::{Assembly, Calc, Error, Fragment, Layout, Line, Reference, Result, Schema};
use std::process::ExitCode;

// Opcodes of the demo target, enough to show every kind of fragment
const LD: u8 = 0xA0;
const CALL: u8 = 0xF8;
const BRA: u8 = 0xB0;
const RET: u8 = 0xC0;

fn op(code: u8, operand: Fragment, text: impl Into<String>) -> Line {
    Line::with_comment(vec![Fragment::bytes([code]), operand], text)
}

fn field_offset(layout: &Layout, path: &str) -> Result<i64> {
    layout
        .offsets
        .at(path)
        .map(|offset| offset as i64)
        .ok_or_else(|| Error::InvalidLayout(format!("no `{}` field", path)))
}

fn program() -> Result<Assembly> {
    let layout = Schema::fields([
        ("cursor", Schema::Size(1)),
        ("score", Schema::Size(2)),
        ("board", Schema::array(4, Schema::array(4, Schema::Size(1)))),
    ])
    .layout()?;
    let score = field_offset(&layout, "score")?;

    let main = Reference::labelled("main");
    let draw = Reference::labelled("draw");
    let sprite = Reference::labelled("sprite");
    let vars = Reference::labelled("vars");

    Assembly::new()
        .add_block_comment(["mpasm demo", ""])
        .add_words([Calc::from(&main), Calc::from(&draw)])
        .routine(&main, |asm| {
            asm.loop_block(|start, asm| {
                Ok(asm
                    .add_line(op(LD, Fragment::word(&vars + score), "ld r0, (vars.score)"))
                    .add_line(op(CALL, Fragment::word(&draw), "call draw"))
                    .add_line(op(BRA, Fragment::relative(start, 2), "bra loop")))
            })
        })?
        .routine(&draw, |asm| {
            Ok(asm
                .add_line(op(LD, Fragment::word(&sprite), "ld r1, sprite"))
                .add_bytes_with([RET], "ret"))
        })?
        .define_with(&sprite, |asm| {
            asm.repeat(8, |_, asm| Ok(asm.add_bytes_with([0x3C, 0x42, 0x81, 0x81], "sprite row")))
        })?
        .add_block_comment(["", "logo"])
        .add_bitmap(&[
            " ##  ##   ###   ",
            " ## ##   #   #  ",
            " ####    #####  ",
            " ## ##   #   #  ",
        ])?
        .define_globals(&vars, &layout, Some(0x00))
}

fn main() -> ExitCode {
    mpasm_cli::main_with(program)
}
