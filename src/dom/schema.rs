//! Element schemas - the property surface of each element kind.
//!
//! Every node kind is described by a [`Prototype`]: a list of property
//! descriptor groups plus an optional parent prototype. Lookups walk the
//! chain from the most derived prototype upward, so a derived kind can
//! override an inherited property (SVG elements make `className` read-only,
//! for example).
//!
//! ```text
//! HTMLVideoElement → HTMLMediaElement → HTMLElement → Element → Node → EventTarget
//! SVGSVGElement    → SVGGraphicsElement → SVGElement → Element → Node → EventTarget
//! Text             → CharacterData → Node → EventTarget
//! ```

use super::Namespace;

// =============================================================================
// Descriptors
// =============================================================================

bitflags::bitflags! {
    /// Property access flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropFlags: u8 {
        const NONE = 0;
        /// Assignment is accepted.
        const WRITABLE = 1 << 0;
        /// The property mirrors a content attribute.
        const REFLECT = 1 << 1;
    }
}

/// How a property stores and coerces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    String,
    Boolean,
    Number,
    /// Addressable object (style declaration, dataset). Valid as an
    /// intermediate segment of a dotted path.
    Object,
    /// Object-valued but not addressable (validity states, animated values).
    Opaque,
    /// `on*` event handler slot.
    EventHandler,
    /// `textContent`-like: assignment replaces the node's children.
    TextContent,
}

/// A single property on a prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropDescriptor {
    pub name: &'static str,
    pub kind: PropKind,
    pub flags: PropFlags,
    /// Reflected attribute name for `REFLECT` properties.
    pub attribute: Option<&'static str>,
}

impl PropDescriptor {
    pub fn is_writable(&self) -> bool {
        self.flags.contains(PropFlags::WRITABLE)
    }

    pub fn reflects(&self) -> bool {
        self.flags.contains(PropFlags::REFLECT)
    }
}

/// Property surface of one element kind.
#[derive(Debug)]
pub struct Prototype {
    pub name: &'static str,
    pub parent: Option<&'static Prototype>,
    pub groups: &'static [&'static [PropDescriptor]],
}

impl Prototype {
    /// Find a property on this prototype or any ancestor.
    pub fn find(&self, name: &str) -> Option<&'static PropDescriptor> {
        let mut current: Option<&Prototype> = Some(self);
        while let Some(proto) = current {
            for group in proto.groups.iter().copied() {
                if let Some(desc) = group.iter().find(|d| d.name == name) {
                    return Some(desc);
                }
            }
            current = proto.parent;
        }
        None
    }

    /// Every property name, own first then inherited. May repeat overridden
    /// names.
    pub fn property_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut current: Option<&Prototype> = Some(self);
        while let Some(proto) = current {
            for group in proto.groups {
                names.extend(group.iter().map(|d| d.name));
            }
            current = proto.parent;
        }
        names
    }

    /// Whether `self` is `other` or derives from it.
    pub fn inherits(&self, other: &Prototype) -> bool {
        let mut current: Option<&Prototype> = Some(self);
        while let Some(proto) = current {
            if std::ptr::eq(proto, other) {
                return true;
            }
            current = proto.parent;
        }
        false
    }
}

// =============================================================================
// Descriptor constructors
// =============================================================================

const fn rw(name: &'static str, kind: PropKind) -> PropDescriptor {
    PropDescriptor {
        name,
        kind,
        flags: PropFlags::WRITABLE,
        attribute: None,
    }
}

const fn ro(name: &'static str, kind: PropKind) -> PropDescriptor {
    PropDescriptor {
        name,
        kind,
        flags: PropFlags::NONE,
        attribute: None,
    }
}

const fn reflect(name: &'static str, kind: PropKind, attribute: &'static str) -> PropDescriptor {
    PropDescriptor {
        name,
        kind,
        flags: PropFlags::WRITABLE.union(PropFlags::REFLECT),
        attribute: Some(attribute),
    }
}

const fn on(name: &'static str) -> PropDescriptor {
    rw(name, PropKind::EventHandler)
}

use PropKind::{Boolean, Number, Object, Opaque, String as Str, TextContent};

// =============================================================================
// Shared groups
// =============================================================================

const GLOBAL_EVENT_HANDLERS: &[PropDescriptor] = &[
    on("onabort"),
    on("onanimationend"),
    on("onanimationiteration"),
    on("onanimationstart"),
    on("onauxclick"),
    on("onbeforeinput"),
    on("onblur"),
    on("oncancel"),
    on("oncanplay"),
    on("oncanplaythrough"),
    on("onchange"),
    on("onclick"),
    on("onclose"),
    on("oncontextmenu"),
    on("oncopy"),
    on("oncut"),
    on("ondblclick"),
    on("ondrag"),
    on("ondragend"),
    on("ondragenter"),
    on("ondragleave"),
    on("ondragover"),
    on("ondragstart"),
    on("ondrop"),
    on("ondurationchange"),
    on("onemptied"),
    on("onended"),
    on("onerror"),
    on("onfocus"),
    on("onfocusin"),
    on("onfocusout"),
    on("oninput"),
    on("oninvalid"),
    on("onkeydown"),
    on("onkeypress"),
    on("onkeyup"),
    on("onload"),
    on("onloadeddata"),
    on("onloadedmetadata"),
    on("onloadstart"),
    on("onmousedown"),
    on("onmouseenter"),
    on("onmouseleave"),
    on("onmousemove"),
    on("onmouseout"),
    on("onmouseover"),
    on("onmouseup"),
    on("onpaste"),
    on("onpause"),
    on("onplay"),
    on("onplaying"),
    on("onpointercancel"),
    on("onpointerdown"),
    on("onpointerenter"),
    on("onpointerleave"),
    on("onpointermove"),
    on("onpointerout"),
    on("onpointerover"),
    on("onpointerup"),
    on("onprogress"),
    on("onratechange"),
    on("onreset"),
    on("onresize"),
    on("onscroll"),
    on("onscrollend"),
    on("onseeked"),
    on("onseeking"),
    on("onselect"),
    on("onstalled"),
    on("onsubmit"),
    on("onsuspend"),
    on("ontimeupdate"),
    on("ontoggle"),
    on("ontouchcancel"),
    on("ontouchend"),
    on("ontouchmove"),
    on("ontouchstart"),
    on("ontransitionend"),
    on("onvolumechange"),
    on("onwaiting"),
    on("onwheel"),
];

/// Members shared by HTML and SVG elements.
const ELEMENT_COMMON: &[PropDescriptor] = &[
    rw("style", Object),
    ro("dataset", Object),
    reflect("tabIndex", Number, "tabindex"),
    reflect("nonce", Str, "nonce"),
    reflect("autofocus", Boolean, "autofocus"),
];

// =============================================================================
// Core prototypes
// =============================================================================

pub static EVENT_TARGET: Prototype = Prototype {
    name: "EventTarget",
    parent: None,
    groups: &[],
};

pub static NODE: Prototype = Prototype {
    name: "Node",
    parent: Some(&EVENT_TARGET),
    groups: &[&[
        ro("nodeName", Str),
        ro("nodeType", Number),
        ro("parentNode", Opaque),
        ro("childNodes", Opaque),
        ro("isConnected", Boolean),
        rw("textContent", TextContent),
    ]],
};

pub static CHARACTER_DATA: Prototype = Prototype {
    name: "CharacterData",
    parent: Some(&NODE),
    groups: &[&[rw("data", Str), rw("nodeValue", Str), ro("length", Number)]],
};

pub static TEXT: Prototype = Prototype {
    name: "Text",
    parent: Some(&CHARACTER_DATA),
    groups: &[&[ro("wholeText", Str)]],
};

pub static ELEMENT: Prototype = Prototype {
    name: "Element",
    parent: Some(&NODE),
    groups: &[&[
        reflect("id", Str, "id"),
        reflect("className", Str, "class"),
        reflect("slot", Str, "slot"),
        ro("tagName", Str),
        ro("localName", Str),
        ro("namespaceURI", Str),
        ro("classList", Opaque),
        ro("attributes", Opaque),
        ro("childElementCount", Number),
    ]],
};

// =============================================================================
// HTML prototypes
// =============================================================================

pub static HTML_ELEMENT: Prototype = Prototype {
    name: "HTMLElement",
    parent: Some(&ELEMENT),
    groups: &[
        &[
            reflect("title", Str, "title"),
            reflect("lang", Str, "lang"),
            reflect("dir", Str, "dir"),
            reflect("hidden", Boolean, "hidden"),
            reflect("accessKey", Str, "accesskey"),
            reflect("inert", Boolean, "inert"),
            rw("innerText", TextContent),
            ro("offsetWidth", Number),
            ro("offsetHeight", Number),
        ],
        ELEMENT_COMMON,
        GLOBAL_EVENT_HANDLERS,
    ],
};

pub static HTML_INPUT: Prototype = Prototype {
    name: "HTMLInputElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        rw("value", Str),
        reflect("defaultValue", Str, "value"),
        rw("checked", Boolean),
        reflect("defaultChecked", Boolean, "checked"),
        reflect("disabled", Boolean, "disabled"),
        reflect("type", Str, "type"),
        reflect("name", Str, "name"),
        reflect("placeholder", Str, "placeholder"),
        reflect("readOnly", Boolean, "readonly"),
        reflect("required", Boolean, "required"),
        reflect("min", Str, "min"),
        reflect("max", Str, "max"),
        reflect("step", Str, "step"),
        reflect("autocomplete", Str, "autocomplete"),
        ro("files", Opaque),
        ro("validity", Opaque),
        ro("form", Opaque),
    ]],
};

pub static HTML_BUTTON: Prototype = Prototype {
    name: "HTMLButtonElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("disabled", Boolean, "disabled"),
        reflect("type", Str, "type"),
        reflect("name", Str, "name"),
        reflect("value", Str, "value"),
        ro("form", Opaque),
    ]],
};

pub static HTML_TEXTAREA: Prototype = Prototype {
    name: "HTMLTextAreaElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        rw("value", Str),
        reflect("disabled", Boolean, "disabled"),
        reflect("name", Str, "name"),
        reflect("placeholder", Str, "placeholder"),
        reflect("rows", Number, "rows"),
        reflect("cols", Number, "cols"),
        reflect("readOnly", Boolean, "readonly"),
        ro("textLength", Number),
    ]],
};

pub static HTML_SELECT: Prototype = Prototype {
    name: "HTMLSelectElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        rw("value", Str),
        rw("selectedIndex", Number),
        reflect("disabled", Boolean, "disabled"),
        reflect("multiple", Boolean, "multiple"),
        reflect("name", Str, "name"),
        ro("options", Opaque),
    ]],
};

pub static HTML_OPTION: Prototype = Prototype {
    name: "HTMLOptionElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("value", Str, "value"),
        reflect("label", Str, "label"),
        rw("selected", Boolean),
        reflect("disabled", Boolean, "disabled"),
        ro("index", Number),
    ]],
};

pub static HTML_ANCHOR: Prototype = Prototype {
    name: "HTMLAnchorElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("href", Str, "href"),
        reflect("target", Str, "target"),
        reflect("rel", Str, "rel"),
        reflect("download", Str, "download"),
        ro("origin", Str),
    ]],
};

pub static HTML_IMAGE: Prototype = Prototype {
    name: "HTMLImageElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("src", Str, "src"),
        reflect("alt", Str, "alt"),
        reflect("width", Number, "width"),
        reflect("height", Number, "height"),
        reflect("loading", Str, "loading"),
        ro("naturalWidth", Number),
        ro("naturalHeight", Number),
        ro("complete", Boolean),
    ]],
};

pub static HTML_LABEL: Prototype = Prototype {
    name: "HTMLLabelElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[reflect("htmlFor", Str, "for"), ro("control", Opaque)]],
};

pub static HTML_FORM: Prototype = Prototype {
    name: "HTMLFormElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("action", Str, "action"),
        reflect("method", Str, "method"),
        reflect("noValidate", Boolean, "novalidate"),
        ro("elements", Opaque),
    ]],
};

pub static HTML_MEDIA: Prototype = Prototype {
    name: "HTMLMediaElement",
    parent: Some(&HTML_ELEMENT),
    groups: &[&[
        reflect("src", Str, "src"),
        reflect("controls", Boolean, "controls"),
        reflect("autoplay", Boolean, "autoplay"),
        reflect("loop", Boolean, "loop"),
        reflect("preload", Str, "preload"),
        rw("muted", Boolean),
        rw("volume", Number),
        rw("currentTime", Number),
        rw("playbackRate", Number),
        ro("paused", Boolean),
        ro("duration", Number),
        ro("readyState", Number),
        ro("buffered", Opaque),
        on("onencrypted"),
        on("onwaitingforkey"),
    ]],
};

pub static HTML_VIDEO: Prototype = Prototype {
    name: "HTMLVideoElement",
    parent: Some(&HTML_MEDIA),
    groups: &[&[
        reflect("poster", Str, "poster"),
        reflect("width", Number, "width"),
        reflect("height", Number, "height"),
        reflect("playsInline", Boolean, "playsinline"),
        ro("videoWidth", Number),
        ro("videoHeight", Number),
        on("onenterpictureinpicture"),
        on("onleavepictureinpicture"),
    ]],
};

pub static HTML_AUDIO: Prototype = Prototype {
    name: "HTMLAudioElement",
    parent: Some(&HTML_MEDIA),
    groups: &[],
};

// =============================================================================
// SVG prototypes
// =============================================================================

pub static SVG_ELEMENT: Prototype = Prototype {
    name: "SVGElement",
    parent: Some(&ELEMENT),
    groups: &[
        &[ro("className", Opaque), ro("ownerSVGElement", Opaque), ro("viewportElement", Opaque)],
        ELEMENT_COMMON,
        GLOBAL_EVENT_HANDLERS,
    ],
};

pub static SVG_GRAPHICS: Prototype = Prototype {
    name: "SVGGraphicsElement",
    parent: Some(&SVG_ELEMENT),
    groups: &[&[ro("transform", Opaque)]],
};

pub static SVG_SVG: Prototype = Prototype {
    name: "SVGSVGElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[
        ro("x", Opaque),
        ro("y", Opaque),
        ro("width", Opaque),
        ro("height", Opaque),
        ro("viewBox", Opaque),
        ro("preserveAspectRatio", Opaque),
        rw("currentScale", Number),
    ]],
};

pub static SVG_CIRCLE: Prototype = Prototype {
    name: "SVGCircleElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("cx", Opaque), ro("cy", Opaque), ro("r", Opaque), ro("pathLength", Opaque)]],
};

pub static SVG_ELLIPSE: Prototype = Prototype {
    name: "SVGEllipseElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("cx", Opaque), ro("cy", Opaque), ro("rx", Opaque), ro("ry", Opaque)]],
};

pub static SVG_RECT: Prototype = Prototype {
    name: "SVGRectElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[
        ro("x", Opaque),
        ro("y", Opaque),
        ro("width", Opaque),
        ro("height", Opaque),
        ro("rx", Opaque),
        ro("ry", Opaque),
    ]],
};

pub static SVG_LINE: Prototype = Prototype {
    name: "SVGLineElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("x1", Opaque), ro("y1", Opaque), ro("x2", Opaque), ro("y2", Opaque)]],
};

pub static SVG_PATH: Prototype = Prototype {
    name: "SVGPathElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("pathLength", Opaque)]],
};

pub static SVG_TEXT: Prototype = Prototype {
    name: "SVGTextElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("x", Opaque), ro("y", Opaque), ro("dx", Opaque), ro("dy", Opaque)]],
};

pub static SVG_FOREIGN_OBJECT: Prototype = Prototype {
    name: "SVGForeignObjectElement",
    parent: Some(&SVG_GRAPHICS),
    groups: &[&[ro("x", Opaque), ro("y", Opaque), ro("width", Opaque), ro("height", Opaque)]],
};

// =============================================================================
// Lookup
// =============================================================================

/// Prototype for an element of the given namespace and local name.
pub fn prototype_for(namespace: Namespace, local_name: &str) -> &'static Prototype {
    match namespace {
        Namespace::Html => match local_name {
            "input" => &HTML_INPUT,
            "button" => &HTML_BUTTON,
            "textarea" => &HTML_TEXTAREA,
            "select" => &HTML_SELECT,
            "option" => &HTML_OPTION,
            "a" => &HTML_ANCHOR,
            "img" => &HTML_IMAGE,
            "label" => &HTML_LABEL,
            "form" => &HTML_FORM,
            "video" => &HTML_VIDEO,
            "audio" => &HTML_AUDIO,
            _ => &HTML_ELEMENT,
        },
        Namespace::Svg => match local_name {
            "svg" => &SVG_SVG,
            "circle" => &SVG_CIRCLE,
            "ellipse" => &SVG_ELLIPSE,
            "rect" => &SVG_RECT,
            "line" => &SVG_LINE,
            "path" => &SVG_PATH,
            "text" => &SVG_TEXT,
            "foreignObject" => &SVG_FOREIGN_OBJECT,
            "g" | "polygon" | "polyline" | "use" | "image" => &SVG_GRAPHICS,
            _ => &SVG_ELEMENT,
        },
    }
}
