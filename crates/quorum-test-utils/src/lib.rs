//! Testing utilities for quorum workspace
//!
//! Shared fixture pairs, artifact helpers, and tracing setup.

#![allow(missing_docs)]

use quorum_diff::{DiffConfig, DiffEngine, SourceArtifact};
use std::sync::Once;

/// A pair of renders for the same task
#[derive(Debug, Clone, Copy)]
pub struct FixturePair {
    pub name: &'static str,
    pub a: &'static str,
    pub b: &'static str,
}

impl FixturePair {
    pub fn artifacts(&self) -> (SourceArtifact, SourceArtifact) {
        (
            SourceArtifact::a(self.a).with_path(format!("{}_a.py", self.name)),
            SourceArtifact::b(self.b).with_path(format!("{}_b.py", self.name)),
        )
    }
}

pub const GREETER: &str = r#"
def hello_world():
    """Simple test function"""
    print("Hello, World!")
    return True

class TestClass:
    def __init__(self, name):
        self.name = name

    def greet(self):
        return f"Hello, {self.name}!"

if __name__ == "__main__":
    test = TestClass("Alice")
    print(test.greet())
"#;

/// Annotated, generic-typed program using modern syntax
pub const TYPED: &str = r#"
from collections import abc

type Pair[T] = tuple[T, T]

class Inventory[K: str, *Rest]:
    counts: dict[K, int]

    def total(self, keys: list[K] | None = None) -> int:
        selected = keys or list(self.counts)
        return sum(self.counts[k] for k in selected)

@cache(maxsize=None)
def first[T](items: abc.Sequence[T], *args: *Rest, **kw: object) -> T | None:
    match items:
        case [head, *_]:
            return head
        case _:
            return None
"#;

/// Same program, different comments and layout
pub const COMMENTS_AND_WHITESPACE: FixturePair = FixturePair {
    name: "comments",
    a: r#"
def calculate_sum(a, b):
    return a + b

def main():
    result = calculate_sum(5, 3)
    print(f"Result: {result}")
"#,
    b: r#"
# helpers for the demo


def calculate_sum(a, b):
    # add the two operands
    return a + b   # done


def main():
    result = calculate_sum(5, 3)  # compute
    print(f"Result: {result}")
"#,
};

/// Same program, local names and parameters renamed
pub const RENAMED_VARIABLES: FixturePair = FixturePair {
    name: "rename",
    a: r"
def process_data(input_list):
    result = []
    for item in input_list:
        if item > 0:
            result.append(item * 2)
    return result
",
    b: r"
def process_data(data_list):
    output = []
    for element in data_list:
        if element > 0:
            output.append(element * 2)
    return output
",
};

pub const FIBONACCI: FixturePair = FixturePair {
    name: "fibonacci",
    a: r#"
def fibonacci(n):
    """Iterative fibonacci"""
    if n <= 1:
        return n
    a, b = 0, 1
    for _ in range(2, n + 1):
        a, b = b, a + b
    return b
"#,
    b: r#"
def fibonacci(n):
    """Recursive fibonacci"""
    if n <= 1:
        return n
    return fibonacci(n - 1) + fibonacci(n - 2)
"#,
};

pub const SORTING: FixturePair = FixturePair {
    name: "sorting",
    a: r#"
def sort_numbers(numbers):
    """Bubble sort implementation"""
    n = len(numbers)
    for i in range(n):
        for j in range(0, n - i - 1):
            if numbers[j] > numbers[j + 1]:
                numbers[j], numbers[j + 1] = numbers[j + 1], numbers[j]
    return numbers
"#,
    b: r#"
def sort_numbers(numbers):
    """Quick sort implementation"""
    if len(numbers) <= 1:
        return numbers

    pivot = numbers[len(numbers) // 2]
    left = [x for x in numbers if x < pivot]
    middle = [x for x in numbers if x == pivot]
    right = [x for x in numbers if x > pivot]

    return sort_numbers(left) + middle + sort_numbers(right)
"#,
};

pub const MISSING_METHODS: FixturePair = FixturePair {
    name: "calculator",
    a: r#"
class Calculator:
    def add(self, a, b):
        return a + b

    def subtract(self, a, b):
        return a - b

    def multiply(self, a, b):
        return a * b

    def divide(self, a, b):
        if b == 0:
            raise ValueError("Cannot divide by zero")
        return a / b
"#,
    b: r"
class Calculator:
    def add(self, a, b):
        return a + b

    def subtract(self, a, b):
        return a - b
",
};

/// One operator differs
pub const SINGLE_OPERATOR: FixturePair = FixturePair {
    name: "operator",
    a: "def step(x):\n    return x + 1\n",
    b: "def step(x):\n    return x - 1\n",
};

pub const SYNTAX_ERROR: FixturePair = FixturePair {
    name: "syntax",
    a: r#"
def valid_function():
    print("This is valid Python")
    return True
"#,
    b: r#"
def invalid_function(:
    print("This has syntax error")
    return True
"#,
};

/// Pairs that must pass at the default threshold
pub const COSMETIC_PAIRS: &[FixturePair] = &[COMMENTS_AND_WHITESPACE, RENAMED_VARIABLES];

/// Pairs that must fail at the default threshold
pub const DIVERGENT_PAIRS: &[FixturePair] = &[FIBONACCI, SORTING, MISSING_METHODS];

/// Statements for assembling random programs
pub const SNIPPETS: &[&str] = &[
    "import os",
    "from typing import List",
    "x = 1",
    "y = x * 2 + 3",
    "def f(a, b=2):\n    return a + b",
    "def g(*args, **kwargs):\n    return len(args)",
    "class A:\n    def m(self):\n        return self.value",
    "for i in range(10):\n    print(i)",
    "while False:\n    break",
    "if x > 1:\n    y = 2\nelif x < 0:\n    y = 3\nelse:\n    y = 4",
    "try:\n    f(1)\nexcept ValueError as err:\n    pass\nfinally:\n    pass",
    "with open('p') as fh:\n    data = fh.read()",
    "squares = [n * n for n in range(5) if n % 2]",
    "lookup = {k: v for k, v in pairs}",
    "values = {'a': 1, **other}",
    "total = sum(x for x in items)",
    "label = f'{x!r:>10}'",
    "flag = a and b or not c",
    "del lookup['a']",
    "async def fetch():\n    await g()",
    "lambda z: z + 1",
    "assert x is not None, 'missing'",
    "# just a comment",
    "def total(xs: list[int]) -> dict[str, int]:\n    return {}",
    "counts: dict[str, list[int]] = {}",
    "type Point = tuple[float, float]",
    "@cache(maxsize=None)\ndef h(n: int | None = None) -> int:\n    return n",
    "class Box[T]:\n    def get[U](self, other: U) -> T:\n        return self.item",
    "match cmd:\n    case [x, *rest]:\n        pass\n    case {'k': v}:\n        pass\n    case _:\n        pass",
    "tail = items[1:-1:2]",
    "nested = ((((x + 1) * 2) - 3) / 4)",
];

/// `x = 1 + 1 + ...` with `terms` additions
pub fn addition_chain(terms: usize) -> String {
    format!("x = {}1\n", "1 + ".repeat(terms))
}

static TRACING: Once = Once::new();

/// Install a test subscriber once; filter with `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub fn default_engine() -> DiffEngine {
    DiffEngine::new(DiffConfig::default()).unwrap()
}

pub fn engine_with_threshold(diff_threshold: f64) -> DiffEngine {
    DiffEngine::new(DiffConfig::new().with_threshold(diff_threshold)).unwrap()
}

pub fn artifacts(a: &str, b: &str) -> (SourceArtifact, SourceArtifact) {
    (SourceArtifact::a(a), SourceArtifact::b(b))
}
