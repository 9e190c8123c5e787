/// The agent-addressing opcode family of the CAOS command language.
///
/// Every opcode is either a *command* (a statement with no value) or a
/// *query* (an expression producing a typed value). Some names exist in
/// both forms, e.g. `ATTR <int>` sets the attributes of TARG while `ATTR`
/// on its own reads them; those pairs are separate variants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // =====================================================================
    // AGENT CREATION
    // =====================================================================
    /// `NEW: SIMP family genus species sprite_file image_count first_image plane`
    NewSimp,
    /// `NEW: COMP ...`, same signature as `NEW: SIMP`.
    NewComp,
    /// `NEW: VHCL ...`, same signature as `NEW: SIMP`.
    NewVhcl,

    // =====================================================================
    // TARGET REGISTER
    // =====================================================================
    /// `TARG agent` (command): rebind TARG.
    TargSet,
    /// `TARG` (query): current TARG, live-linked to the register.
    Targ,
    /// `OWNR` (query): owner of the running script.
    Ownr,
    /// `NULL` (query): the empty agent.
    Null,
    /// `PNTR` (query): the pointer agent.
    Pntr,
    /// `RTAR family genus species` (command): TARG a random matching agent.
    Rtar,
    /// `FROM` (query)
    From,
    /// `CARR` (query)
    Carr,

    // =====================================================================
    // AGENT STATE
    // =====================================================================
    /// `ATTR attr` (command)
    AttrSet,
    /// `ATTR` (query)
    Attr,
    /// `ANIM poselist` (command)
    Anim,
    /// `FMLY` (query)
    Fmly,
    /// `GNUS` (query)
    Gnus,
    /// `SPCS` (query)
    Spcs,
    /// `PLNE` (query)
    Plne,
    /// `KILL agent` (command)
    Kill,
    /// `POSE pose` (command)
    PoseSet,
    /// `POSE` (query)
    Pose,
    /// `BASE index` (command)
    BaseSet,
    /// `BASE` (query)
    Base,
    /// `ABBA` (query)
    Abba,
    /// `TICK tickrate` (command)
    Tick,
    /// `BHVR bhvr` (command)
    BhvrSet,
    /// `BHVR` (query)
    Bhvr,

    // =====================================================================
    // SCRIPTS
    // =====================================================================
    /// `NEXT` (command)
    Next,
    /// `SCRX family genus species event` (command)
    Scrx,

    // =====================================================================
    // OUTPUT
    // =====================================================================
    /// `OUTV value` (command): append an integer to the output buffer.
    Outv,
    /// `OUTS text` (command): append a string to the output buffer.
    Outs,
}

/// The semantic type of an operand or query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Integer,
    String,
    ByteString,
    Agent,
}

impl std::fmt::Display for ArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArgType::Integer => "integer",
            ArgType::String => "string",
            ArgType::ByteString => "byte-string",
            ArgType::Agent => "agent",
        };
        f.write_str(name)
    }
}

/// Whether an opcode is a statement or an expression of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Command,
    Query(ArgType),
}

/// A named, typed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ArgType,
}

const fn p(name: &'static str, ty: ArgType) -> Param {
    Param { name, ty }
}

/// The declared signature of an opcode: its script name, kind and exact
/// parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub kind: OpKind,
    pub params: &'static [Param],
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_command(&self) -> bool {
        self.kind == OpKind::Command
    }
}

use ArgType::{Agent, ByteString, Integer, String as Str};

const NEW_AGENT_PARAMS: &[Param] = &[
    p("family", Integer),
    p("genus", Integer),
    p("species", Integer),
    p("sprite_file", Str),
    p("image_count", Integer),
    p("first_image", Integer),
    p("plane", Integer),
];

const CLASSIFIER_PARAMS: &[Param] = &[
    p("family", Integer),
    p("genus", Integer),
    p("species", Integer),
];

const fn command(name: &'static str, params: &'static [Param]) -> Signature {
    Signature { name, kind: OpKind::Command, params }
}

const fn query(name: &'static str, ty: ArgType) -> Signature {
    Signature { name, kind: OpKind::Query(ty), params: &[] }
}

impl OpCode {
    /// Every opcode, in declaration order.
    pub const ALL: &'static [OpCode] = &[
        OpCode::NewSimp,
        OpCode::NewComp,
        OpCode::NewVhcl,
        OpCode::TargSet,
        OpCode::Targ,
        OpCode::Ownr,
        OpCode::Null,
        OpCode::Pntr,
        OpCode::Rtar,
        OpCode::From,
        OpCode::Carr,
        OpCode::AttrSet,
        OpCode::Attr,
        OpCode::Anim,
        OpCode::Fmly,
        OpCode::Gnus,
        OpCode::Spcs,
        OpCode::Plne,
        OpCode::Kill,
        OpCode::PoseSet,
        OpCode::Pose,
        OpCode::BaseSet,
        OpCode::Base,
        OpCode::Abba,
        OpCode::Tick,
        OpCode::BhvrSet,
        OpCode::Bhvr,
        OpCode::Next,
        OpCode::Scrx,
        OpCode::Outv,
        OpCode::Outs,
    ];

    pub fn signature(self) -> Signature {
        match self {
            OpCode::NewSimp => command("new: simp", NEW_AGENT_PARAMS),
            OpCode::NewComp => command("new: comp", NEW_AGENT_PARAMS),
            OpCode::NewVhcl => command("new: vhcl", NEW_AGENT_PARAMS),

            OpCode::TargSet => command("targ", &[Param { name: "agent", ty: Agent }]),
            OpCode::Targ => query("targ", Agent),
            OpCode::Ownr => query("ownr", Agent),
            OpCode::Null => query("null", Agent),
            OpCode::Pntr => query("pntr", Agent),
            OpCode::Rtar => command("rtar", CLASSIFIER_PARAMS),
            OpCode::From => query("from", Agent),
            OpCode::Carr => query("carr", Agent),

            OpCode::AttrSet => command("attr", &[Param { name: "attr", ty: Integer }]),
            OpCode::Attr => query("attr", Integer),
            OpCode::Anim => command("anim", &[Param { name: "poselist", ty: ByteString }]),
            OpCode::Fmly => query("fmly", Integer),
            OpCode::Gnus => query("gnus", Integer),
            OpCode::Spcs => query("spcs", Integer),
            OpCode::Plne => query("plne", Integer),
            OpCode::Kill => command("kill", &[Param { name: "agent", ty: Agent }]),
            OpCode::PoseSet => command("pose", &[Param { name: "pose", ty: Integer }]),
            OpCode::Pose => query("pose", Integer),
            OpCode::BaseSet => command("base", &[Param { name: "index", ty: Integer }]),
            OpCode::Base => query("base", Integer),
            OpCode::Abba => query("abba", Integer),
            OpCode::Tick => command("tick", &[Param { name: "tickrate", ty: Integer }]),
            OpCode::BhvrSet => command("bhvr", &[Param { name: "bhvr", ty: Integer }]),
            OpCode::Bhvr => query("bhvr", Integer),

            OpCode::Next => command("next", &[]),
            OpCode::Scrx => command(
                "scrx",
                &[
                    Param { name: "family", ty: Integer },
                    Param { name: "genus", ty: Integer },
                    Param { name: "species", ty: Integer },
                    Param { name: "event", ty: Integer },
                ],
            ),

            OpCode::Outv => command("outv", &[Param { name: "value", ty: Integer }]),
            OpCode::Outs => command("outs", &[Param { name: "text", ty: Str }]),
        }
    }

    pub fn name(self) -> &'static str {
        self.signature().name
    }

    /// Find the command form of `name` (case-insensitive).
    pub fn lookup_command(name: &str) -> Option<OpCode> {
        Self::lookup(name, |sig| sig.is_command())
    }

    /// Find the query form of `name` (case-insensitive).
    pub fn lookup_query(name: &str) -> Option<OpCode> {
        Self::lookup(name, |sig| !sig.is_command())
    }

    fn lookup(name: &str, accept: impl Fn(&Signature) -> bool) -> Option<OpCode> {
        OpCode::ALL.iter().copied().find(|op| {
            let sig = op.signature();
            accept(&sig) && sig.name.eq_ignore_ascii_case(name)
        })
    }

    /// True if some opcode name starts with `prefix` followed by a space,
    /// i.e. `prefix` is the namespace word of a two-word opcode (`new:`).
    pub fn is_namespace(prefix: &str) -> bool {
        OpCode::ALL.iter().any(|op| {
            op.name()
                .split_once(' ')
                .is_some_and(|(head, _)| head.eq_ignore_ascii_case(prefix))
        })
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}
